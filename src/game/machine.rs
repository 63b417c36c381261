//! Game session state machine
//!
//! All session mutation happens here. Transitions return [`Effect`]s for the
//! scheduler to carry out; timers come back in as [`Timer`] checkpoints and
//! are re-evaluated against live state when they fire.
//!
//! ```text
//!   Idle ──start──▶ Playing ──stop──▶ Paused
//!                      ▲                 │
//!                      └────restart──────┘
//! ```
//!
//! Every checkpoint carries the epoch it was scheduled in. The epoch advances
//! on each start/stop/restart, so a checkpoint left over from an earlier
//! stretch of play is a no-op.

use std::time::Duration;

use rand::Rng;

use crate::combination::{Color, Combination, random_combination};
use crate::voice::Intent;

use super::spin::{AUTO_SPIN_DELAY, RESTART_DELAY, SETTLE_DELAY, SpinCycle};

/// Smallest accepted pause between results
pub const MIN_PAUSE_SECS: u8 = 1;

/// Largest accepted pause between results
pub const MAX_PAUSE_SECS: u8 = 10;

/// Pause used when nothing is configured
pub const DEFAULT_PAUSE_SECS: u8 = 3;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never started
    Idle,
    /// Cycling through spins
    Playing,
    /// Explicitly stopped
    Paused,
}

/// Screen background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    /// Plain white
    #[default]
    Blank,
    /// Color of the latest tick
    Color(Color),
}

impl Background {
    /// CSS-style value for the background
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Blank => "#ffffff",
            Self::Color(color) => color.name(),
        }
    }
}

/// Observable session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    pub game_started: bool,
    pub is_spinning: bool,
    pub current_selection: Option<Combination>,
    pub show_result: bool,
    pub pause_duration_secs: u8,
    pub should_auto_spin: bool,
    pub background: Background,
}

impl Session {
    #[must_use]
    pub fn new(pause_duration_secs: u8) -> Self {
        Self {
            phase: Phase::Idle,
            game_started: false,
            is_spinning: false,
            current_selection: None,
            show_result: false,
            pause_duration_secs: clamp_pause(pause_duration_secs),
            should_auto_spin: false,
            background: Background::Blank,
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    fn reset_display(&mut self) {
        self.current_selection = None;
        self.background = Background::Blank;
        self.show_result = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_SECS)
    }
}

/// Clamp a pause duration into the accepted range
#[must_use]
pub fn clamp_pause(secs: u8) -> u8 {
    secs.clamp(MIN_PAUSE_SECS, MAX_PAUSE_SECS)
}

/// Clamp any whole number of seconds, negative or huge, into the pause range
#[must_use]
pub fn pause_from_secs(secs: i64) -> u8 {
    let clamped = secs.clamp(i64::from(MIN_PAUSE_SECS), i64::from(MAX_PAUSE_SECS));
    u8::try_from(clamped).map_or(DEFAULT_PAUSE_SECS, clamp_pause)
}

/// Scheduled checkpoints of a spin cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Next animation tick
    Tick,
    /// Terminal tick settled; reveal and announce
    Reveal,
    /// Pause elapsed; hide the result
    Hide,
    /// Auto-spin delay elapsed
    AutoSpin,
    /// Restart delay elapsed
    Restart,
}

/// A checkpoint tagged with the epoch it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub checkpoint: Checkpoint,
    pub epoch: u64,
}

/// Work the scheduler performs on behalf of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `timer` back to the machine after `delay`
    Schedule { timer: Timer, delay: Duration },
    /// Abort the pending tick timer
    CancelTicks,
    /// Announce the final selection
    Announce(Combination),
}

/// The session state machine
#[derive(Debug)]
pub struct GameMachine<R> {
    session: Session,
    epoch: u64,
    cycle: Option<SpinCycle>,
    rng: R,
}

impl<R: Rng> GameMachine<R> {
    pub fn new(pause_duration_secs: u8, rng: R) -> Self {
        Self {
            session: Session::new(pause_duration_secs),
            epoch: 0,
            cycle: None,
            rng,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Idle → Playing, then spin
    pub fn start_game(&mut self) -> Vec<Effect> {
        if self.session.phase != Phase::Idle {
            tracing::debug!(phase = ?self.session.phase, "start ignored");
            return Vec::new();
        }

        self.session.game_started = true;
        self.session.phase = Phase::Playing;
        self.session.reset_display();
        self.epoch += 1;
        tracing::info!("game started");

        self.spin()
    }

    /// Playing → Paused; a no-op in any other phase
    pub fn stop_game(&mut self) -> Vec<Effect> {
        if self.session.phase != Phase::Playing {
            return Vec::new();
        }

        self.session.phase = Phase::Paused;
        self.session.is_spinning = false;
        self.session.show_result = false;
        self.session.should_auto_spin = false;
        self.cycle = None;
        self.epoch += 1;
        tracing::info!("game stopped");

        vec![Effect::CancelTicks]
    }

    /// Paused → Playing, spinning again after [`RESTART_DELAY`]
    pub fn restart_game(&mut self) -> Vec<Effect> {
        if self.session.phase != Phase::Paused {
            tracing::debug!(phase = ?self.session.phase, "restart ignored");
            return Vec::new();
        }

        self.session.phase = Phase::Playing;
        self.session.is_spinning = false;
        self.session.reset_display();
        self.epoch += 1;
        tracing::info!("game restarted");

        vec![self.schedule(Checkpoint::Restart, RESTART_DELAY)]
    }

    /// Map a voice intent onto a transition
    pub fn apply_intent(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::Stop if self.session.is_playing() => self.stop_game(),
            Intent::Start if !self.session.game_started => self.start_game(),
            Intent::Start if self.session.phase == Phase::Paused => self.restart_game(),
            _ => {
                tracing::debug!(%intent, phase = ?self.session.phase, "intent ignored");
                Vec::new()
            }
        }
    }

    /// Change the pause between results; clamped to the accepted range
    pub fn set_pause_duration(&mut self, secs: u8) {
        self.session.pause_duration_secs = clamp_pause(secs);
    }

    /// Handle a checkpoint coming due
    pub fn fire(&mut self, timer: Timer) -> Vec<Effect> {
        if timer.epoch != self.epoch || !self.session.is_playing() {
            tracing::trace!(?timer, epoch = self.epoch, "stale checkpoint");
            return Vec::new();
        }

        match timer.checkpoint {
            Checkpoint::Tick => self.tick(),
            Checkpoint::Reveal => self.reveal(),
            Checkpoint::Hide => self.hide(),
            Checkpoint::AutoSpin => {
                if self.session.should_auto_spin && !self.session.is_spinning {
                    self.spin()
                } else {
                    Vec::new()
                }
            }
            Checkpoint::Restart => self.spin(),
        }
    }

    fn spin(&mut self) -> Vec<Effect> {
        if self.cycle.is_some() {
            tracing::debug!("spin already running");
            return Vec::new();
        }

        let cycle = SpinCycle::new(&mut self.rng);
        tracing::debug!(ticks = cycle.target(), "spin started");

        self.session.is_spinning = true;
        self.session.show_result = false;
        self.session.should_auto_spin = false;
        let delay = cycle.next_delay();
        self.cycle = Some(cycle);

        vec![self.schedule(Checkpoint::Tick, delay)]
    }

    fn tick(&mut self) -> Vec<Effect> {
        let Some(cycle) = self.cycle.as_mut() else {
            return Vec::new();
        };

        let selection = random_combination(&mut self.rng);
        self.session.current_selection = Some(selection);
        self.session.background = Background::Color(selection.color);

        if !cycle.record_tick() {
            let delay = cycle.next_delay();
            return vec![self.schedule(Checkpoint::Tick, delay)];
        }

        self.cycle = None;
        self.session.is_spinning = false;
        tracing::debug!(combination = %selection, "spin landed");

        vec![self.schedule(Checkpoint::Reveal, SETTLE_DELAY)]
    }

    fn reveal(&mut self) -> Vec<Effect> {
        let Some(selection) = self.session.current_selection else {
            return Vec::new();
        };

        self.session.show_result = true;
        tracing::info!(combination = %selection, "result revealed");

        let pause = Duration::from_secs(u64::from(self.session.pause_duration_secs));
        vec![
            Effect::Announce(selection),
            self.schedule(Checkpoint::Hide, pause),
        ]
    }

    fn hide(&mut self) -> Vec<Effect> {
        self.session.show_result = false;
        self.session.should_auto_spin = true;
        self.watch_auto_spin()
    }

    /// Schedule the next spin once auto-spin is requested
    fn watch_auto_spin(&self) -> Vec<Effect> {
        if self.session.should_auto_spin && self.session.is_playing() && !self.session.is_spinning
        {
            vec![self.schedule(Checkpoint::AutoSpin, AUTO_SPIN_DELAY)]
        } else {
            Vec::new()
        }
    }

    const fn schedule(&self, checkpoint: Checkpoint, delay: Duration) -> Effect {
        Effect::Schedule {
            timer: Timer {
                checkpoint,
                epoch: self.epoch,
            },
            delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::combination::COMBINATIONS;

    fn machine() -> GameMachine<StdRng> {
        GameMachine::new(DEFAULT_PAUSE_SECS, StdRng::seed_from_u64(3))
    }

    fn scheduled(effects: &[Effect]) -> Option<(Timer, Duration)> {
        effects.iter().find_map(|e| match e {
            Effect::Schedule { timer, delay } => Some((*timer, *delay)),
            _ => None,
        })
    }

    /// Fire ticks until the terminal tick schedules a reveal
    fn run_ticks(machine: &mut GameMachine<StdRng>, first: Timer) -> (u32, Timer) {
        let mut timer = first;
        let mut ticks = 0;
        loop {
            let effects = machine.fire(timer);
            ticks += 1;
            let (next, _) = scheduled(&effects).expect("tick schedules a follow-up");
            if next.checkpoint == Checkpoint::Reveal {
                return (ticks, next);
            }
            timer = next;
        }
    }

    #[test]
    fn test_initial_state() {
        let machine = machine();
        let session = machine.session();
        assert_eq!(session.phase, Phase::Idle);
        assert!(!session.game_started);
        assert!(!session.is_spinning);
        assert!(session.current_selection.is_none());
        assert_eq!(session.background, Background::Blank);
        assert_eq!(session.pause_duration_secs, 3);
    }

    #[test]
    fn test_start_schedules_first_tick() {
        let mut machine = machine();
        let effects = machine.start_game();

        let (timer, delay) = scheduled(&effects).unwrap();
        assert_eq!(timer.checkpoint, Checkpoint::Tick);
        assert_eq!(delay, Duration::from_millis(200));
        assert!(machine.session().game_started);
        assert!(machine.session().is_playing());
        assert!(machine.session().is_spinning);
    }

    #[test]
    fn test_full_cycle() {
        let mut machine = machine();
        let (first, _) = scheduled(&machine.start_game()).unwrap();

        let (ticks, reveal) = run_ticks(&mut machine, first);
        assert!((20..40).contains(&ticks));
        assert!(!machine.session().is_spinning);
        assert!(!machine.session().show_result);

        let selection = machine.session().current_selection.unwrap();
        assert!(COMBINATIONS.contains(&selection));
        assert_eq!(machine.session().background, Background::Color(selection.color));

        let effects = machine.fire(reveal);
        assert!(machine.session().show_result);
        assert!(effects.contains(&Effect::Announce(selection)));
        let (hide, pause) = scheduled(&effects).unwrap();
        assert_eq!(hide.checkpoint, Checkpoint::Hide);
        assert_eq!(pause, Duration::from_secs(3));

        let effects = machine.fire(hide);
        assert!(!machine.session().show_result);
        assert!(machine.session().should_auto_spin);
        let (auto, delay) = scheduled(&effects).unwrap();
        assert_eq!(auto.checkpoint, Checkpoint::AutoSpin);
        assert_eq!(delay, AUTO_SPIN_DELAY);

        let effects = machine.fire(auto);
        assert!(machine.session().is_spinning);
        assert!(!machine.session().should_auto_spin);
        assert_eq!(scheduled(&effects).unwrap().0.checkpoint, Checkpoint::Tick);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut machine = machine();
        machine.start_game();

        assert_eq!(machine.stop_game(), vec![Effect::CancelTicks]);
        let once = machine.session().clone();
        let epoch = machine.epoch();

        assert!(machine.stop_game().is_empty());
        assert_eq!(machine.session(), &once);
        assert_eq!(machine.epoch(), epoch);
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let mut machine = machine();
        assert!(machine.stop_game().is_empty());
        assert_eq!(machine.session().phase, Phase::Idle);
    }

    #[test]
    fn test_stop_during_ticks_freezes_selection() {
        let mut machine = machine();
        let (first, _) = scheduled(&machine.start_game()).unwrap();
        let effects = machine.fire(first);
        let (second, _) = scheduled(&effects).unwrap();
        let ticked = machine.session().current_selection;

        machine.stop_game();
        assert!(machine.fire(second).is_empty());
        assert_eq!(machine.session().current_selection, ticked);
        assert!(!machine.session().is_spinning);
    }

    #[test]
    fn test_start_then_stop_shows_nothing() {
        let mut machine = machine();
        let (first, _) = scheduled(&machine.start_game()).unwrap();
        machine.stop_game();

        assert!(machine.fire(first).is_empty());
        assert!(!machine.session().show_result);
        assert!(machine.session().current_selection.is_none());
        assert_eq!(machine.session().background, Background::Blank);
    }

    #[test]
    fn test_stale_reveal_after_stop() {
        let mut machine = machine();
        let (first, _) = scheduled(&machine.start_game()).unwrap();
        let (_, reveal) = run_ticks(&mut machine, first);

        machine.stop_game();
        assert!(machine.fire(reveal).is_empty());
        assert!(!machine.session().show_result);
    }

    #[test]
    fn test_stale_reveal_after_restart() {
        let mut machine = machine();
        let (first, _) = scheduled(&machine.start_game()).unwrap();
        let (_, reveal) = run_ticks(&mut machine, first);

        machine.stop_game();
        machine.restart_game();
        assert!(machine.fire(reveal).is_empty());
        assert!(!machine.session().show_result);
        assert!(machine.session().current_selection.is_none());
    }

    #[test]
    fn test_hide_after_stop_does_not_request_auto_spin() {
        let mut machine = machine();
        let (first, _) = scheduled(&machine.start_game()).unwrap();
        let (_, reveal) = run_ticks(&mut machine, first);
        let (hide, _) = scheduled(&machine.fire(reveal)).unwrap();

        machine.stop_game();
        assert!(machine.fire(hide).is_empty());
        assert!(!machine.session().should_auto_spin);
    }

    #[test]
    fn test_restart_spins_after_delay() {
        let mut machine = machine();
        machine.start_game();
        machine.stop_game();

        let effects = machine.restart_game();
        let (timer, delay) = scheduled(&effects).unwrap();
        assert_eq!(timer.checkpoint, Checkpoint::Restart);
        assert_eq!(delay, RESTART_DELAY);
        assert!(machine.session().is_playing());
        assert!(!machine.session().is_spinning);

        let effects = machine.fire(timer);
        assert!(machine.session().is_spinning);
        assert_eq!(scheduled(&effects).unwrap().0.checkpoint, Checkpoint::Tick);
    }

    #[test]
    fn test_restart_timer_dropped_if_stopped_again() {
        let mut machine = machine();
        machine.start_game();
        machine.stop_game();
        let (timer, _) = scheduled(&machine.restart_game()).unwrap();

        machine.stop_game();
        assert!(machine.fire(timer).is_empty());
        assert!(!machine.session().is_spinning);
    }

    #[test]
    fn test_restart_only_from_paused() {
        let mut machine = machine();
        assert!(machine.restart_game().is_empty());
        machine.start_game();
        assert!(machine.restart_game().is_empty());
    }

    #[test]
    fn test_intents() {
        let mut machine = machine();

        // Stop while idle does nothing
        assert!(machine.apply_intent(Intent::Stop).is_empty());

        // First start begins the game
        assert!(!machine.apply_intent(Intent::Start).is_empty());
        assert!(machine.session().is_playing());

        // Start while playing is a no-op
        let epoch = machine.epoch();
        assert!(machine.apply_intent(Intent::Start).is_empty());
        assert_eq!(machine.epoch(), epoch);

        assert_eq!(machine.apply_intent(Intent::Stop), vec![Effect::CancelTicks]);
        assert_eq!(machine.session().phase, Phase::Paused);

        // Start while paused restarts
        let effects = machine.apply_intent(Intent::Start);
        assert_eq!(scheduled(&effects).unwrap().0.checkpoint, Checkpoint::Restart);
        assert!(machine.session().is_playing());
    }

    #[test]
    fn test_pause_duration_clamped() {
        let mut machine = machine();
        machine.set_pause_duration(0);
        assert_eq!(machine.session().pause_duration_secs, 1);
        machine.set_pause_duration(42);
        assert_eq!(machine.session().pause_duration_secs, 10);
        machine.set_pause_duration(7);
        assert_eq!(machine.session().pause_duration_secs, 7);

        assert_eq!(Session::new(0).pause_duration_secs, 1);
    }

    #[test]
    fn test_pause_from_wide_values() {
        assert_eq!(pause_from_secs(300), 10);
        assert_eq!(pause_from_secs(-1), 1);
        assert_eq!(pause_from_secs(i64::MIN), 1);
        assert_eq!(pause_from_secs(4), 4);
    }

    #[test]
    fn test_background_css() {
        assert_eq!(Background::Blank.css(), "#ffffff");
        assert_eq!(Background::Color(Color::Green).css(), "green");
    }
}
