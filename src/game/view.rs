//! Display text derived from a session snapshot

use super::machine::{Phase, Session};

/// Sentence telling players what to do next
#[must_use]
pub fn instruction(session: &Session) -> String {
    let target = session.current_selection.map_or_else(
        || "body parts on the colors".to_string(),
        |c| format!("{} on {}", c.body_part.name().to_lowercase(), c.color),
    );
    format!("Place your {target} as instructed.")
}

/// Upper-cased result banner, present only while the result is shown
#[must_use]
pub fn result_banner(session: &Session) -> Option<String> {
    if !session.show_result {
        return None;
    }
    session.current_selection.map(|c| {
        format!(
            "{} {}",
            c.color.name().to_uppercase(),
            c.body_part.name().to_uppercase()
        )
    })
}

/// Label of the primary control
#[must_use]
pub const fn control_label(session: &Session) -> &'static str {
    if !session.game_started {
        "Start Game"
    } else if session.is_spinning {
        "Stop Spinning"
    } else if matches!(session.phase, Phase::Playing) {
        "Stop Game"
    } else {
        "Restart Game"
    }
}

/// One-line status summary for the terminal
#[must_use]
pub fn status_line(session: &Session) -> String {
    let mut line = format!(
        "[{}] {} | pause {}s | bg {}",
        control_label(session),
        instruction(session),
        session.pause_duration_secs,
        session.background.css()
    );
    if let Some(banner) = result_banner(session) {
        line.push_str(" | ");
        line.push_str(&banner);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combination::{BodyPart, Color, Combination};

    fn session_with(selection: Option<Combination>) -> Session {
        Session {
            current_selection: selection,
            ..Session::default()
        }
    }

    #[test]
    fn test_instruction_without_selection() {
        assert_eq!(
            instruction(&Session::default()),
            "Place your body parts on the colors as instructed."
        );
    }

    #[test]
    fn test_instruction_with_selection() {
        let session = session_with(Some(Combination::new(Color::Red, BodyPart::LeftHand)));
        assert_eq!(
            instruction(&session),
            "Place your left hand on red as instructed."
        );
    }

    #[test]
    fn test_result_banner_only_when_shown() {
        let mut session = session_with(Some(Combination::new(Color::Blue, BodyPart::RightFoot)));
        assert_eq!(result_banner(&session), None);

        session.show_result = true;
        assert_eq!(result_banner(&session).as_deref(), Some("BLUE RIGHT FOOT"));
    }

    #[test]
    fn test_control_labels() {
        let mut session = Session::default();
        assert_eq!(control_label(&session), "Start Game");

        session.game_started = true;
        session.phase = Phase::Playing;
        session.is_spinning = true;
        assert_eq!(control_label(&session), "Stop Spinning");

        session.is_spinning = false;
        assert_eq!(control_label(&session), "Stop Game");

        session.phase = Phase::Paused;
        assert_eq!(control_label(&session), "Restart Game");
    }
}
