//! Settings navigation: which config mode is open and what the encoder edits.

use crate::input::Rotation;
use crate::modes::DisplayMode;
use crate::settings::{ClockSettings, MAX_DIM_LEVEL, MAX_VOLUME, TRACK_COUNT};

use log::debug;

/// Alarm settings selectable with the encoder button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmSlot {
    /// Alarm hour.
    Hour,
    /// Alarm minute.
    Minute,
    /// AM/PM.
    Period,
    /// Armed or not.
    Enabled,
    /// Alarm track.
    Track,
    /// Base volume.
    Volume,
}

impl AlarmSlot {
    /// Following slot, wrapping after the last.
    pub fn next(self) -> Self {
        match self {
            AlarmSlot::Hour => AlarmSlot::Minute,
            AlarmSlot::Minute => AlarmSlot::Period,
            AlarmSlot::Period => AlarmSlot::Enabled,
            AlarmSlot::Enabled => AlarmSlot::Track,
            AlarmSlot::Track => AlarmSlot::Volume,
            AlarmSlot::Volume => AlarmSlot::Hour,
        }
    }
}

/// Display settings selectable with the encoder button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplaySlot {
    /// Manual dim level.
    DimLevel,
    /// Display override flag.
    Override,
}

impl DisplaySlot {
    /// Following slot, wrapping after the last.
    pub fn next(self) -> Self {
        match self {
            DisplaySlot::DimLevel => DisplaySlot::Override,
            DisplaySlot::Override => DisplaySlot::DimLevel,
        }
    }
}

/// Which settings screen is open. At most one is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConfigMode {
    /// Showing the time only.
    #[default]
    Idle,
    /// Editing the alarm.
    Alarm(AlarmSlot),
    /// Editing the display.
    Display(DisplaySlot),
}

impl ConfigMode {
    /// Open or close the alarm screen. Opening starts at the hour.
    pub fn toggle_alarm(&mut self) {
        *self = match self {
            ConfigMode::Alarm(_) => ConfigMode::Idle,
            _ => ConfigMode::Alarm(AlarmSlot::Hour),
        };
        debug!("config mode: {self:?}");
    }

    /// Open or close the display screen. Opening starts at the dim level.
    pub fn toggle_display(&mut self) {
        *self = match self {
            ConfigMode::Display(_) => ConfigMode::Idle,
            _ => ConfigMode::Display(DisplaySlot::DimLevel),
        };
        debug!("config mode: {self:?}");
    }

    /// Move to the next slot of the open screen. Returns false when idle.
    pub fn advance_slot(&mut self) -> bool {
        match self {
            ConfigMode::Idle => return false,
            ConfigMode::Alarm(slot) => *slot = slot.next(),
            ConfigMode::Display(slot) => *slot = slot.next(),
        }
        debug!("config mode: {self:?}");
        true
    }
}

/// What an alarm-screen edit touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEdit {
    /// Hour, minute or period changed.
    Time,
    /// The armed flag flipped.
    Enabled,
    /// A different track was picked.
    Track,
    /// The base volume changed.
    Volume,
}

/// Apply one encoder step on an alarm slot.
///
/// Period and armed flag toggle whichever way the knob turns.
pub fn rotate_alarm(slot: AlarmSlot, rotation: Rotation, settings: &mut ClockSettings) -> AlarmEdit {
    use crate::input::Rotation::{Clockwise, CounterClockwise};

    let edit = match (slot, rotation) {
        (AlarmSlot::Hour, Clockwise) => {
            settings.alarm_hour = settings.alarm_hour % 12 + 1;
            AlarmEdit::Time
        }
        (AlarmSlot::Hour, CounterClockwise) => {
            settings.alarm_hour = if settings.alarm_hour <= 1 { 12 } else { settings.alarm_hour - 1 };
            AlarmEdit::Time
        }
        (AlarmSlot::Minute, Clockwise) => {
            settings.alarm_minute = (settings.alarm_minute + 1) % 60;
            AlarmEdit::Time
        }
        (AlarmSlot::Minute, CounterClockwise) => {
            settings.alarm_minute = (settings.alarm_minute + 59) % 60;
            AlarmEdit::Time
        }
        (AlarmSlot::Period, _) => {
            settings.period = settings.period.toggled();
            AlarmEdit::Time
        }
        (AlarmSlot::Enabled, _) => {
            settings.alarm_enabled = !settings.alarm_enabled;
            AlarmEdit::Enabled
        }
        (AlarmSlot::Track, Clockwise) => {
            settings.alarm_track = settings.alarm_track % TRACK_COUNT + 1;
            AlarmEdit::Track
        }
        (AlarmSlot::Track, CounterClockwise) => {
            settings.alarm_track = if settings.alarm_track <= 1 {
                TRACK_COUNT
            } else {
                settings.alarm_track - 1
            };
            AlarmEdit::Track
        }
        (AlarmSlot::Volume, Clockwise) => {
            settings.vol_level = (settings.vol_level + 1) % (MAX_VOLUME + 1);
            AlarmEdit::Volume
        }
        (AlarmSlot::Volume, CounterClockwise) => {
            settings.vol_level = if settings.vol_level == 0 { MAX_VOLUME } else { settings.vol_level - 1 };
            AlarmEdit::Volume
        }
    };
    debug!("{slot:?} {rotation:?}: {edit:?}");
    edit
}

/// Apply one encoder step on a display slot.
///
/// Changing the dim level switches to [`DisplayMode::ManualDim`]; the override
/// toggles whichever way the knob turns.
pub fn rotate_display(slot: DisplaySlot, rotation: Rotation, settings: &mut ClockSettings) {
    let levels = MAX_DIM_LEVEL + 1;
    match (slot, rotation) {
        (DisplaySlot::DimLevel, Rotation::Clockwise) => {
            settings.display_mode = DisplayMode::ManualDim;
            settings.manual_dim_level = (settings.manual_dim_level + 1) % levels;
        }
        (DisplaySlot::DimLevel, Rotation::CounterClockwise) => {
            settings.display_mode = DisplayMode::ManualDim;
            settings.manual_dim_level = (settings.manual_dim_level + levels - 1) % levels;
        }
        (DisplaySlot::Override, _) => {
            settings.display_override = !settings.display_override;
        }
    }
    debug!("{slot:?} {rotation:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Period;
    use crate::input::Rotation::{Clockwise, CounterClockwise};

    #[test]
    fn test_modes_are_exclusive() {
        let mut mode = ConfigMode::Idle;
        mode.toggle_alarm();
        assert_eq!(mode, ConfigMode::Alarm(AlarmSlot::Hour));
        mode.toggle_display();
        assert_eq!(mode, ConfigMode::Display(DisplaySlot::DimLevel));
        mode.toggle_display();
        assert_eq!(mode, ConfigMode::Idle);
    }

    #[test]
    fn test_slots_cycle() {
        let mut mode = ConfigMode::Idle;
        assert!(!mode.advance_slot());

        mode.toggle_alarm();
        let slots: Vec<AlarmSlot> = (0..7)
            .map(|_| {
                let ConfigMode::Alarm(slot) = mode else { unreachable!() };
                mode.advance_slot();
                slot
            })
            .collect();
        assert_eq!(
            slots,
            [
                AlarmSlot::Hour,
                AlarmSlot::Minute,
                AlarmSlot::Period,
                AlarmSlot::Enabled,
                AlarmSlot::Track,
                AlarmSlot::Volume,
                AlarmSlot::Hour,
            ]
        );

        let mut mode = ConfigMode::Display(DisplaySlot::Override);
        assert!(mode.advance_slot());
        assert_eq!(mode, ConfigMode::Display(DisplaySlot::DimLevel));
    }

    #[test]
    fn test_hour_and_minute_wrap() {
        let mut settings = ClockSettings {
            alarm_hour: 12,
            alarm_minute: 59,
            ..Default::default()
        };
        assert_eq!(rotate_alarm(AlarmSlot::Hour, Clockwise, &mut settings), AlarmEdit::Time);
        assert_eq!(settings.alarm_hour, 1);
        rotate_alarm(AlarmSlot::Hour, CounterClockwise, &mut settings);
        assert_eq!(settings.alarm_hour, 12);

        rotate_alarm(AlarmSlot::Minute, Clockwise, &mut settings);
        assert_eq!(settings.alarm_minute, 0);
        rotate_alarm(AlarmSlot::Minute, CounterClockwise, &mut settings);
        assert_eq!(settings.alarm_minute, 59);
    }

    #[test]
    fn test_toggles_ignore_direction() {
        let mut settings = ClockSettings::default();
        rotate_alarm(AlarmSlot::Period, Clockwise, &mut settings);
        assert_eq!(settings.period, Period::Pm);
        rotate_alarm(AlarmSlot::Period, Clockwise, &mut settings);
        assert_eq!(settings.period, Period::Am);

        assert_eq!(
            rotate_alarm(AlarmSlot::Enabled, CounterClockwise, &mut settings),
            AlarmEdit::Enabled
        );
        assert!(settings.alarm_enabled);
        rotate_alarm(AlarmSlot::Enabled, CounterClockwise, &mut settings);
        assert!(!settings.alarm_enabled);
    }

    #[test]
    fn test_track_and_volume_wrap() {
        let mut settings = ClockSettings {
            alarm_track: 6,
            vol_level: 95,
            ..Default::default()
        };
        rotate_alarm(AlarmSlot::Track, Clockwise, &mut settings);
        assert_eq!(settings.alarm_track, 1);
        rotate_alarm(AlarmSlot::Track, CounterClockwise, &mut settings);
        assert_eq!(settings.alarm_track, 6);

        assert_eq!(
            rotate_alarm(AlarmSlot::Volume, Clockwise, &mut settings),
            AlarmEdit::Volume
        );
        assert_eq!(settings.vol_level, 0);
        rotate_alarm(AlarmSlot::Volume, CounterClockwise, &mut settings);
        assert_eq!(settings.vol_level, 95);
    }

    #[test]
    fn test_display_slots() {
        let mut settings = ClockSettings {
            manual_dim_level: 15,
            display_mode: DisplayMode::AutoOff,
            ..Default::default()
        };
        rotate_display(DisplaySlot::DimLevel, Clockwise, &mut settings);
        assert_eq!(settings.manual_dim_level, 0);
        assert_eq!(settings.display_mode, DisplayMode::ManualDim);
        rotate_display(DisplaySlot::DimLevel, CounterClockwise, &mut settings);
        assert_eq!(settings.manual_dim_level, 15);

        rotate_display(DisplaySlot::Override, CounterClockwise, &mut settings);
        assert!(!settings.display_override);
        rotate_display(DisplaySlot::Override, CounterClockwise, &mut settings);
        assert!(settings.display_override);
    }
}
