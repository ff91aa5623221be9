//! Persisted clock settings and the stores that hold them.

use crate::error::ClockError;
use crate::modes::DisplayMode;

use chrono::{NaiveTime, Timelike};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default settings file name, relative to the working directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Number of selectable alarm tracks (`01.mp3` .. `06.mp3`).
pub const TRACK_COUNT: u8 = 6;

/// Highest mixer volume reachable from the encoder.
pub const MAX_VOLUME: u8 = 95;

/// Highest display dim level.
pub const MAX_DIM_LEVEL: u8 = 15;

// =============================================================================
// Period
// =============================================================================

/// Half of the day an alarm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Midnight up to noon.
    #[serde(rename = "AM")]
    Am,
    /// Noon up to midnight.
    #[serde(rename = "PM")]
    Pm,
}

impl Period {
    /// The other period.
    pub fn toggled(self) -> Self {
        match self {
            Period::Am => Period::Pm,
            Period::Pm => Period::Am,
        }
    }

    /// Period a wall-clock time falls in.
    pub fn of<T: Timelike>(time: &T) -> Self {
        if time.hour12().0 { Period::Pm } else { Period::Am }
    }

    /// Label shown on the alphanumeric display.
    pub fn label(self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Convert a 24-hour hour into a 12-hour hour and its period.
///
/// `0 -> (12, AM)`, `12 -> (12, PM)`, `13 -> (1, PM)`.
pub fn hour_from_24(hour: u32) -> (u8, Period) {
    match hour {
        0 => (12, Period::Am),
        1..=11 => (hour as u8, Period::Am),
        12 => (12, Period::Pm),
        _ => ((hour - 12) as u8, Period::Pm),
    }
}

/// Convert a 12-hour hour and period into a 24-hour hour.
pub fn hour_to_24(hour: u8, period: Period) -> u32 {
    let hour = u32::from(hour % 12);
    match period {
        Period::Am => hour,
        Period::Pm => hour + 12,
    }
}

/// Parse an `HH:MM` 24-hour string.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, ClockError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ClockError::InvalidTime(value.to_string()))
}

/// Serde adapter for the `"ON"`/`"OFF"` flags of the settings file.
mod on_off {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "ON" } else { "OFF" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Text(String),
            Bool(bool),
        }

        match Flag::deserialize(deserializer)? {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => match text.to_ascii_uppercase().as_str() {
                "ON" => Ok(true),
                "OFF" => Ok(false),
                other => Err(serde::de::Error::custom(format!(
                    "expected \"ON\" or \"OFF\", found \"{other}\""
                ))),
            },
        }
    }
}

// =============================================================================
// ClockSettings
// =============================================================================

/// The user-editable settings of the clock.
///
/// Every field carries its on-disk key. Missing keys fall back to the
/// per-field default, so older and newer files both load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Alarm hour on the 12-hour dial (1-12).
    pub alarm_hour: u8,
    /// Alarm minute (0-59).
    pub alarm_minute: u8,
    /// Alarm period.
    pub period: Period,
    /// Whether the alarm is armed.
    #[serde(rename = "alarm_stat", with = "on_off")]
    pub alarm_enabled: bool,
    /// Selected alarm track (1-6).
    pub alarm_track: u8,
    /// Base mixer volume (0-95).
    pub vol_level: u8,
    /// Brightness used in [`DisplayMode::ManualDim`] (0-15).
    pub manual_dim_level: u8,
    /// Brightness used in [`DisplayMode::AutoDim`] (0-15).
    pub auto_dim_level: u8,
    /// Whether the display mode follows the time of day.
    #[serde(with = "on_off")]
    pub auto_dim: bool,
    /// Last resolved display mode. Advisory; recomputed every tick.
    pub display_mode: DisplayMode,
    /// When on, time-of-day bands never switch the display off.
    #[serde(with = "on_off")]
    pub display_override: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            alarm_hour: 4,
            alarm_minute: 0,
            period: Period::Am,
            alarm_enabled: false,
            alarm_track: 1,
            vol_level: 65,
            manual_dim_level: 6,
            auto_dim_level: 0,
            auto_dim: true,
            display_mode: DisplayMode::ManualDim,
            display_override: true,
        }
    }
}

/// On-disk layout: the settings plus the derived `alarm_time` key.
#[derive(Serialize, Deserialize)]
struct SettingsFile {
    #[serde(flatten)]
    settings: ClockSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alarm_time: Option<String>,
}

fn check_range(name: &'static str, value: u8, min: u8, max: u8) -> Result<(), ClockError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ClockError::InvalidSetting {
            name,
            value: i64::from(value),
            min: i64::from(min),
            max: i64::from(max),
        })
    }
}

impl ClockSettings {
    /// Configured alarm time of day, in 24-hour form.
    pub fn fire_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(
            hour_to_24(self.alarm_hour, self.period),
            u32::from(self.alarm_minute),
            0,
        )
        .unwrap_or_default()
    }

    /// Set hour, minute and period from a 24-hour time.
    pub fn set_fire_time(&mut self, time: NaiveTime) {
        let (hour, period) = hour_from_24(time.hour());
        self.alarm_hour = hour;
        self.alarm_minute = time.minute() as u8;
        self.period = period;
    }

    /// Alarm time as shown while editing it: `h*100 + m`.
    pub fn alarm_display_number(&self) -> u32 {
        u32::from(self.alarm_hour) * 100 + u32::from(self.alarm_minute)
    }

    /// Check every range invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), ClockError> {
        check_range("alarm_hour", self.alarm_hour, 1, 12)?;
        check_range("alarm_minute", self.alarm_minute, 0, 59)?;
        check_range("alarm_track", self.alarm_track, 1, TRACK_COUNT)?;
        check_range("vol_level", self.vol_level, 0, MAX_VOLUME)?;
        check_range("manual_dim_level", self.manual_dim_level, 0, MAX_DIM_LEVEL)?;
        check_range("auto_dim_level", self.auto_dim_level, 0, MAX_DIM_LEVEL)?;
        Ok(())
    }

    /// Replace out-of-range values with their defaults, logging each one.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let fields: [(&'static str, &mut u8, u8, u8, u8); 6] = [
            ("alarm_hour", &mut self.alarm_hour, 1, 12, defaults.alarm_hour),
            ("alarm_minute", &mut self.alarm_minute, 0, 59, defaults.alarm_minute),
            ("alarm_track", &mut self.alarm_track, 1, TRACK_COUNT, defaults.alarm_track),
            ("vol_level", &mut self.vol_level, 0, MAX_VOLUME, defaults.vol_level),
            (
                "manual_dim_level",
                &mut self.manual_dim_level,
                0,
                MAX_DIM_LEVEL,
                defaults.manual_dim_level,
            ),
            (
                "auto_dim_level",
                &mut self.auto_dim_level,
                0,
                MAX_DIM_LEVEL,
                defaults.auto_dim_level,
            ),
        ];
        for (name, value, min, max, default) in fields {
            if let Err(e) = check_range(name, *value, min, max) {
                warn!("{e}; using default {default}");
                *value = default;
            }
        }
        self
    }

    /// Serialize to the settings file format.
    pub fn to_json(&self) -> Result<String, ClockError> {
        let file = SettingsFile {
            settings: self.clone(),
            alarm_time: Some(self.fire_time().format("%H:%M").to_string()),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Parse the settings file format.
    ///
    /// When `alarm_time` is present it wins over `alarm_hour`, `alarm_minute`
    /// and `period`. An unparsable `alarm_time` is logged and ignored.
    pub fn from_json(text: &str) -> Result<Self, ClockError> {
        let file: SettingsFile = serde_json::from_str(text)?;
        let mut settings = file.settings;
        if let Some(alarm_time) = file.alarm_time {
            match parse_hhmm(&alarm_time) {
                Ok(time) => settings.set_fire_time(time),
                Err(e) => warn!("ignoring alarm_time: {e}"),
            }
        }
        Ok(settings.sanitized())
    }
}

// =============================================================================
// Settings Stores
// =============================================================================

/// Somewhere settings can be loaded from and saved to.
///
/// This allows an in-memory store in tests.
pub trait SettingsStore {
    /// Load the stored settings, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<ClockSettings>, ClockError>;

    /// Replace the stored settings.
    fn save(&self, settings: &ClockSettings) -> Result<(), ClockError>;
}

/// Load settings, falling back to defaults on a missing or unreadable store.
pub fn load_or_default(store: &dyn SettingsStore) -> ClockSettings {
    match store.load() {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            debug!("no stored settings, using defaults");
            ClockSettings::default()
        }
        Err(e) => {
            error!("failed to load settings: {e}");
            ClockSettings::default()
        }
    }
}

/// Settings kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<ClockSettings>, ClockError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        ClockSettings::from_json(&text).map(Some)
    }

    /// Refuses to write settings that fail [`ClockSettings::validate`].
    fn save(&self, settings: &ClockSettings) -> Result<(), ClockError> {
        settings.validate()?;
        fs::write(&self.path, settings.to_json()?)?;
        debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_conversion() {
        assert_eq!(hour_from_24(0), (12, Period::Am));
        assert_eq!(hour_from_24(7), (7, Period::Am));
        assert_eq!(hour_from_24(12), (12, Period::Pm));
        assert_eq!(hour_from_24(13), (1, Period::Pm));
        assert_eq!(hour_from_24(23), (11, Period::Pm));

        assert_eq!(hour_to_24(12, Period::Am), 0);
        assert_eq!(hour_to_24(12, Period::Pm), 12);
        assert_eq!(hour_to_24(1, Period::Pm), 13);
        assert_eq!(hour_to_24(4, Period::Am), 4);
    }

    #[test]
    fn test_alarm_time_rederives_hour_and_period() {
        let cases = [("00:00", 12, Period::Am), ("12:00", 12, Period::Pm), ("13:00", 1, Period::Pm)];
        for (alarm_time, hour, period) in cases {
            let json = format!(r#"{{"alarm_hour": 5, "period": "AM", "alarm_time": "{alarm_time}"}}"#);
            let settings = ClockSettings::from_json(&json).unwrap();
            assert_eq!(settings.alarm_hour, hour, "{alarm_time}");
            assert_eq!(settings.period, period, "{alarm_time}");
            assert_eq!(settings.alarm_minute, 0);
        }
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let settings = ClockSettings {
            alarm_hour: 6,
            alarm_minute: 45,
            period: Period::Pm,
            alarm_enabled: true,
            alarm_track: 3,
            vol_level: 80,
            manual_dim_level: 11,
            auto_dim_level: 2,
            auto_dim: false,
            display_mode: DisplayMode::AutoOff,
            display_override: false,
        };

        let json = settings.to_json().unwrap();
        assert!(json.contains(r#""alarm_time": "18:45""#));
        assert!(json.contains(r#""alarm_stat": "ON""#));
        assert!(json.contains(r#""display_mode": "AUTO_OFF""#));

        assert_eq!(ClockSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings = ClockSettings::from_json(r#"{"vol_level": 30}"#).unwrap();
        assert_eq!(settings.vol_level, 30);
        assert_eq!(
            ClockSettings { vol_level: 65, ..settings },
            ClockSettings::default()
        );
    }

    #[test]
    fn test_legacy_values() {
        let settings =
            ClockSettings::from_json(r#"{"display_mode": "ON", "auto_dim": "OFF", "alarm_stat": true}"#)
                .unwrap();
        assert_eq!(settings.display_mode, DisplayMode::ManualDim);
        assert!(!settings.auto_dim);
        assert!(settings.alarm_enabled);
    }

    #[test]
    fn test_out_of_range_values_are_replaced() {
        let settings =
            ClockSettings::from_json(r#"{"alarm_hour": 0, "manual_dim_level": 40, "alarm_track": 2}"#)
                .unwrap();
        assert_eq!(settings.alarm_hour, 4);
        assert_eq!(settings.manual_dim_level, 6);
        assert_eq!(settings.alarm_track, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_violation() {
        let settings = ClockSettings {
            alarm_minute: 60,
            ..Default::default()
        };
        match settings.validate() {
            Err(ClockError::InvalidSetting { name, value, .. }) => {
                assert_eq!(name, "alarm_minute");
                assert_eq!(value, 60);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_alarm_time_keeps_keys() {
        let settings =
            ClockSettings::from_json(r#"{"alarm_hour": 9, "alarm_time": "9 o'clock"}"#).unwrap();
        assert_eq!(settings.alarm_hour, 9);
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join(SETTINGS_FILE));

        assert!(store.load().unwrap().is_none());
        assert_eq!(load_or_default(&store), ClockSettings::default());

        let settings = ClockSettings {
            alarm_hour: 12,
            alarm_minute: 5,
            period: Period::Am,
            ..Default::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_file_store_refuses_out_of_range_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join(SETTINGS_FILE));
        let settings = ClockSettings {
            vol_level: 96,
            ..Default::default()
        };

        assert!(matches!(
            store.save(&settings),
            Err(ClockError::InvalidSetting { name: "vol_level", .. })
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(ClockError::Json(_))));
        assert_eq!(load_or_default(&store), ClockSettings::default());
    }
}
