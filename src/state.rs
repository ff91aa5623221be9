//! Clock state snapshot.

use crate::alarm::AlarmStatus;
use crate::modes::DisplayMode;
use crate::nav::ConfigMode;

use chrono::NaiveTime;

/// A snapshot of the clock's runtime state.
///
/// Use [`AlarmClock::state`](crate::AlarmClock::state) to obtain one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    /// Mode resolved on the last tick.
    pub display_mode: DisplayMode,
    /// Mode actually rendered, which differs while a wave has woken the display.
    pub effective_mode: DisplayMode,
    /// Open settings screen.
    pub config_mode: ConfigMode,
    /// Alarm engine state.
    pub alarm: AlarmStatus,
    /// Next fire time, including snooze offsets.
    pub fire_time: NaiveTime,
    /// Whether a wave has temporarily lit the display.
    pub woken: bool,
}
