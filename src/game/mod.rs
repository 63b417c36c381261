//! Game session: spin timing, state machine and the scheduler driving it

mod controller;
mod machine;
mod spin;
pub mod view;

pub use controller::{Command, GameController, GameHandle};
pub use machine::{
    Background, Checkpoint, DEFAULT_PAUSE_SECS, Effect, GameMachine, MAX_PAUSE_SECS,
    MIN_PAUSE_SECS, Phase, Session, Timer, clamp_pause, pause_from_secs,
};
pub use spin::{
    AUTO_SPIN_DELAY, RESTART_DELAY, SETTLE_DELAY, SpinCycle, TICK_RANGE, tick_interval,
};
