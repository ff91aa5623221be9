//! Display modes and the time-of-day mode resolver.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

const fn hm(hour: u32, minute: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(time) => time,
        None => panic!("invalid band time"),
    }
}

// =============================================================================
// Display Mode
// =============================================================================

/// How the displays are lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayMode {
    /// Lit at the manual dim level. Older settings files store this as `"ON"`.
    #[default]
    #[serde(alias = "ON")]
    ManualDim,
    /// Lit at the auto dim level.
    AutoDim,
    /// Blank, chosen by the user.
    ManualOff,
    /// Blank, chosen by the time-of-day bands.
    AutoOff,
}

impl DisplayMode {
    /// Whether the displays should be blank.
    pub fn is_off(self) -> bool {
        matches!(self, DisplayMode::ManualOff | DisplayMode::AutoOff)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayMode::ManualDim => "MANUAL_DIM",
            DisplayMode::AutoDim => "AUTO_DIM",
            DisplayMode::ManualOff => "MANUAL_OFF",
            DisplayMode::AutoOff => "AUTO_OFF",
        })
    }
}

// =============================================================================
// Band Schedule
// =============================================================================

/// Time-of-day bands the resolver switches on.
///
/// Each band documents which of its bounds are inclusive; the resolver
/// compares full `HH:MM:SS` times against these `HH:MM:00` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSchedule {
    /// Day band `[day_start, day_end]` shows [`DisplayMode::ManualDim`].
    pub day_start: NaiveTime,
    /// End of the day band, inclusive.
    pub day_end: NaiveTime,
    /// Evening band `(day_end, evening_end]` shows [`DisplayMode::AutoDim`].
    pub evening_end: NaiveTime,
    /// Quiet band `(quiet_start, quiet_end]` is off while the alarm is disarmed.
    pub quiet_start: NaiveTime,
    /// End of the quiet band, inclusive.
    pub quiet_end: NaiveTime,
    /// With the alarm armed, `[pre_alarm_start, fire)` is off.
    pub pre_alarm_start: NaiveTime,
    /// With the alarm armed, `[fire, wake_end)` is lit.
    pub wake_end: NaiveTime,
}

impl BandSchedule {
    /// The bands used on the nightstand.
    pub const fn production() -> Self {
        Self {
            day_start: hm(7, 30),
            day_end: hm(22, 0),
            evening_end: hm(23, 59),
            quiet_start: hm(0, 0),
            quiet_end: hm(7, 0),
            pre_alarm_start: hm(0, 1),
            wake_end: hm(7, 30),
        }
    }

    /// Compressed afternoon bands for trying the resolver out at a desk.
    pub const fn debug() -> Self {
        Self {
            day_end: hm(12, 0),
            evening_end: hm(12, 59),
            quiet_start: hm(13, 0),
            quiet_end: hm(15, 0),
            ..Self::production()
        }
    }
}

impl Default for BandSchedule {
    fn default() -> Self {
        Self::production()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Everything the resolver looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeInputs {
    /// Whether bands apply at all.
    pub auto_dim: bool,
    /// Whether the alarm is armed.
    pub alarm_enabled: bool,
    /// Mode in effect before this tick.
    pub current: DisplayMode,
    /// Current time of day.
    pub now: NaiveTime,
    /// Time the alarm fires, including snooze offsets.
    pub fire_time: NaiveTime,
    /// Override flag: when on, no band switches the display off.
    pub override_on: bool,
}

/// Resolve the display mode for a tick.
///
/// Pure: the same inputs always give the same mode. Outside every band the
/// current mode is kept.
pub fn resolve_mode(schedule: &BandSchedule, inputs: &ModeInputs) -> DisplayMode {
    let mut mode = inputs.current;
    if !inputs.auto_dim {
        return mode;
    }

    let t = inputs.now;
    if schedule.day_start <= t && t <= schedule.day_end {
        mode = DisplayMode::ManualDim;
    } else if schedule.day_end < t && t <= schedule.evening_end {
        mode = DisplayMode::AutoDim;
    }

    if inputs.alarm_enabled {
        if schedule.pre_alarm_start <= t && t < inputs.fire_time && !inputs.override_on {
            mode = DisplayMode::AutoOff;
        }
        if inputs.fire_time <= t && t < schedule.wake_end {
            mode = DisplayMode::ManualDim;
        }
    } else if schedule.quiet_start < t && t <= schedule.quiet_end && !inputs.override_on {
        mode = DisplayMode::AutoOff;
    }

    mode
}
