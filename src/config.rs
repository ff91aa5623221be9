//! Runtime configuration.

use crate::alarm::AlarmTimings;
use crate::modes::BandSchedule;
use crate::settings::SETTINGS_FILE;

use chrono::TimeDelta;
use std::path::PathBuf;
use std::time::Duration;

/// Timing, band and path configuration for the control loop.
///
/// Unlike [`ClockSettings`](crate::ClockSettings) none of this is edited
/// from the knobs or persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockConfig {
    /// Settings file location.
    pub settings_path: PathBuf,
    /// Sleep between ticks.
    pub tick_interval: Duration,
    /// Sleep between ticks while ringing.
    pub ring_poll_interval: Duration,
    /// Minimum time between two presses of one arcade button.
    pub debounce: Duration,
    /// Snooze, micro-snooze and cooldown.
    pub alarm: AlarmTimings,
    /// How long a wave lights a display that is off.
    pub wake_duration: Duration,
    /// Time-of-day bands.
    pub bands: BandSchedule,
    /// Whether to play tracks.
    pub audio: bool,
    /// Directory holding `01.mp3` .. `06.mp3`.
    pub track_dir: PathBuf,
}

impl ClockConfig {
    /// Set the gesture snooze length in minutes.
    pub fn with_snooze_minutes(mut self, minutes: u32) -> Self {
        self.alarm.snooze = TimeDelta::minutes(i64::from(minutes));
        self
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(SETTINGS_FILE),
            tick_interval: Duration::from_millis(50),
            ring_poll_interval: Duration::from_millis(100),
            debounce: Duration::from_millis(250),
            alarm: AlarmTimings::default(),
            wake_duration: Duration::from_secs(5),
            bands: BandSchedule::production(),
            audio: false,
            track_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snooze_minutes_override() {
        let config = ClockConfig::default().with_snooze_minutes(9);
        assert_eq!(config.alarm.snooze, TimeDelta::minutes(9));
        assert_eq!(config.alarm.micro_snooze, TimeDelta::minutes(1));

        let config = ClockConfig::default().with_snooze_minutes(u32::MAX);
        assert_eq!(config.alarm.snooze.num_minutes(), i64::from(u32::MAX));
    }
}
