//! Time sources.

use chrono::{Local, NaiveDateTime, Timelike};
use std::time::{Duration, Instant};

/// Supplies the time once per tick.
///
/// Wall-clock time drives the bands and the alarm; the monotonic reading
/// drives debouncing and cooldowns so clock adjustments never stretch them.
pub trait TimeSource {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Time elapsed on a monotonic clock since some fixed origin.
    fn monotonic(&self) -> Duration;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose monotonic origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 12-hour time as the numeric display shows it: `h*100 + m`.
pub fn display_number<T: Timelike>(time: &T) -> u32 {
    time.hour12().1 * 100 + time.minute()
}

/// State of the blinking colon: lit on odd seconds.
pub fn colon_on<T: Timelike>(time: &T) -> bool {
    time.second() % 2 == 1
}
