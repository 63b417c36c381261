//! The fixed table of color / body-part combinations

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

/// Mat colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Green,
}

impl Color {
    /// All colors in table order
    pub const ALL: [Self; 4] = [Self::Red, Self::Yellow, Self::Blue, Self::Green];

    /// Lower-case color name, also used in asset filenames
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Hand or foot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limb {
    Hand,
    Foot,
}

impl Limb {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hand => "hand",
            Self::Foot => "foot",
        }
    }
}

/// Body parts placed on the mat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

impl BodyPart {
    /// All body parts in table order
    pub const ALL: [Self; 4] = [
        Self::LeftHand,
        Self::RightHand,
        Self::LeftFoot,
        Self::RightFoot,
    ];

    /// Display name (e.g. "Left Hand")
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftHand => "Left Hand",
            Self::RightHand => "Right Hand",
            Self::LeftFoot => "Left Foot",
            Self::RightFoot => "Right Foot",
        }
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::LeftHand | Self::LeftFoot => Side::Left,
            Self::RightHand | Self::RightFoot => Side::Right,
        }
    }

    #[must_use]
    pub const fn limb(self) -> Limb {
        match self {
            Self::LeftHand | Self::RightHand => Limb::Hand,
            Self::LeftFoot | Self::RightFoot => Limb::Foot,
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One spinner outcome: a body part and the color it goes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub color: Color,
    pub body_part: BodyPart,
}

impl Combination {
    #[must_use]
    pub const fn new(color: Color, body_part: BodyPart) -> Self {
        Self { color, body_part }
    }

    /// Pre-recorded asset name: `{side}-{type}-{color}.mp3`
    #[must_use]
    pub fn audio_filename(&self) -> String {
        format!(
            "{}-{}-{}.mp3",
            self.body_part.side().as_str(),
            self.body_part.limb().as_str(),
            self.color.name()
        )
    }

    /// Text handed to speech synthesis (e.g. "red Left Hand")
    #[must_use]
    pub fn spoken_text(&self) -> String {
        format!("{} {}", self.color.name(), self.body_part.name())
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.body_part)
    }
}

const fn build_table() -> [Combination; 16] {
    let mut table = [Combination::new(Color::Red, BodyPart::LeftHand); 16];
    let mut c = 0;
    while c < Color::ALL.len() {
        let mut b = 0;
        while b < BodyPart::ALL.len() {
            table[c * BodyPart::ALL.len() + b] = Combination::new(Color::ALL[c], BodyPart::ALL[b]);
            b += 1;
        }
        c += 1;
    }
    table
}

/// Every combination, colors outer and body parts inner
pub static COMBINATIONS: [Combination; 16] = build_table();

/// Pick a combination uniformly at random
pub fn random_combination<R: Rng + ?Sized>(rng: &mut R) -> Combination {
    // The table is a non-empty static, so `choose` always yields
    COMBINATIONS
        .choose(rng)
        .copied()
        .unwrap_or(COMBINATIONS[0])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_table_has_every_pair_once() {
        let unique: HashSet<_> = COMBINATIONS.iter().collect();
        assert_eq!(unique.len(), 16);

        for color in Color::ALL {
            for part in BodyPart::ALL {
                let count = COMBINATIONS
                    .iter()
                    .filter(|c| c.color == color && c.body_part == part)
                    .count();
                assert_eq!(count, 1, "{color} {part}");
            }
        }
    }

    #[test]
    fn test_table_order() {
        assert_eq!(COMBINATIONS[0], Combination::new(Color::Red, BodyPart::LeftHand));
        assert_eq!(COMBINATIONS[3], Combination::new(Color::Red, BodyPart::RightFoot));
        assert_eq!(COMBINATIONS[4], Combination::new(Color::Yellow, BodyPart::LeftHand));
        assert_eq!(COMBINATIONS[15], Combination::new(Color::Green, BodyPart::RightFoot));
    }

    #[test]
    fn test_audio_filename() {
        let combo = Combination::new(Color::Red, BodyPart::LeftHand);
        assert_eq!(combo.audio_filename(), "left-hand-red.mp3");

        let combo = Combination::new(Color::Green, BodyPart::RightFoot);
        assert_eq!(combo.audio_filename(), "right-foot-green.mp3");
    }

    #[test]
    fn test_audio_filenames_unique() {
        let names: HashSet<_> = COMBINATIONS.iter().map(Combination::audio_filename).collect();
        assert_eq!(names.len(), 16);
    }

    #[test]
    fn test_spoken_text() {
        let combo = Combination::new(Color::Blue, BodyPart::LeftFoot);
        assert_eq!(combo.spoken_text(), "blue Left Foot");
    }

    #[test]
    fn test_random_combination_in_table() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let combo = random_combination(&mut rng);
            assert!(COMBINATIONS.contains(&combo));
        }
    }
}
