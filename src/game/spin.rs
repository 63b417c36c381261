//! Spin cycle timing
//!
//! A cycle delivers a random number of ticks, each picking a provisional
//! combination, before settling on the last one.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;

/// Tick count target range (upper bound exclusive)
pub const TICK_RANGE: Range<u32> = 20..40;

/// Delay before the first tick
const BASE_TICK_MS: u64 = 200;

/// Delay reduction per delivered tick
const TICK_STEP_MS: u64 = 3;

/// Floor for the tick delay
const MIN_TICK_MS: u64 = 50;

/// Pause between the terminal tick and the result reveal
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Pause between hiding a result and the next automatic spin
pub const AUTO_SPIN_DELAY: Duration = Duration::from_millis(500);

/// Pause between a restart and its first spin
pub const RESTART_DELAY: Duration = Duration::from_millis(100);

/// Delay before the tick that follows `delivered` earlier ticks
///
/// `max(50ms, 200ms - 3ms * delivered)`. The interval shrinks as the cycle
/// progresses, so the animation speeds up towards the final pick.
#[must_use]
pub fn tick_interval(delivered: u32) -> Duration {
    let step = TICK_STEP_MS.saturating_mul(u64::from(delivered));
    Duration::from_millis(BASE_TICK_MS.saturating_sub(step).max(MIN_TICK_MS))
}

/// Progress of one running spin animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinCycle {
    target: u32,
    delivered: u32,
}

impl SpinCycle {
    /// Start a cycle with a target drawn uniformly from [`TICK_RANGE`]
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_target(rng.gen_range(TICK_RANGE))
    }

    /// Start a cycle with an explicit tick target (at least one tick)
    #[must_use]
    pub fn with_target(target: u32) -> Self {
        Self {
            target: target.max(1),
            delivered: 0,
        }
    }

    /// Delay before the next tick
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        tick_interval(self.delivered)
    }

    /// Record a delivered tick; returns true on the terminal tick
    pub fn record_tick(&mut self) -> bool {
        self.delivered += 1;
        self.is_complete()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.delivered >= self.target
    }

    #[must_use]
    pub const fn target(&self) -> u32 {
        self.target
    }

    #[must_use]
    pub const fn delivered(&self) -> u32 {
        self.delivered
    }
}
