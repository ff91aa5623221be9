//! Control loop for a bedside LED alarm clock.
//!
//! The clock drives two 4-character LED displays (a 14-segment one for
//! messages and settings, a 7-segment one for the time), reads two arcade
//! buttons, a rotary encoder and a gesture sensor, and rings a single daily
//! alarm with snooze and a rising volume.
//!
//! Every device sits behind a small trait, so the loop runs the same against
//! real hardware, the logging stand-ins the binary uses, or the mocks.
//!
//! # Example
//!
//! ```no_run
//! use aclock::{AlarmClock, ClockConfig, Devices, JsonFileStore, LogDisplay, NoInput, SystemClock};
//! use std::sync::atomic::AtomicBool;
//!
//! let config = ClockConfig::default();
//! let devices = Devices {
//!     alpha: Box::new(LogDisplay::new("alpha")),
//!     numeric: Box::new(LogDisplay::new("numeric")),
//!     buttons: Box::new(NoInput),
//!     encoder: Box::new(NoInput),
//!     gesture: Box::new(NoInput),
//!     clock: Box::new(SystemClock::new()),
//!     store: Box::new(JsonFileStore::new(&config.settings_path)),
//!     audio: aclock::audio::from_config(&config),
//! };
//!
//! let stop = AtomicBool::new(false);
//! AlarmClock::new(config, devices).run(&stop);
//! ```
//!
//! # Testing
//!
//! The [`mock`] devices share their state between clones, so a test keeps
//! one handle and gives the other to the clock:
//!
//! ```
//! use aclock::mock::{MemoryStore, MockAudio, MockButtons, MockClock, MockDisplay, MockEncoder, MockGesture};
//! use aclock::{AlarmClock, ClockConfig, Content, Devices};
//! use chrono::NaiveDate;
//!
//! let now = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap().and_hms_opt(9, 41, 0).unwrap();
//! let numeric = MockDisplay::new();
//! let mut clock = AlarmClock::new(
//!     ClockConfig::default(),
//!     Devices {
//!         alpha: Box::new(MockDisplay::new()),
//!         numeric: Box::new(numeric.clone()),
//!         buttons: Box::new(MockButtons::new()),
//!         encoder: Box::new(MockEncoder::new()),
//!         gesture: Box::new(MockGesture::new()),
//!         clock: Box::new(MockClock::new(now)),
//!         store: Box::new(MemoryStore::new()),
//!         audio: Box::new(MockAudio::new()),
//!     },
//! );
//!
//! clock.tick();
//! assert_eq!(numeric.content(), Content::Number(941));
//! ```

#![warn(missing_docs)]

pub mod alarm;
pub mod audio;
pub mod clock;
mod config;
mod controller;
pub mod display;
mod error;
pub mod input;
pub mod mock;
pub mod modes;
pub mod nav;
pub mod settings;
mod state;

// Re-export public API
pub use alarm::{AlarmEngine, AlarmStatus, AlarmTimings, AlarmTransition};
pub use clock::{SystemClock, TimeSource};
pub use config::ClockConfig;
pub use controller::{AlarmClock, Devices};
pub use display::{Content, DisplaySurface, LogDisplay, Renderer};
pub use error::ClockError;
pub use input::{ButtonPad, Gesture, GestureSensor, NoInput, ProximityWave, RotaryEncoder};
pub use modes::{BandSchedule, DisplayMode, ModeInputs, resolve_mode};
pub use nav::ConfigMode;
pub use settings::{ClockSettings, JsonFileStore, Period, SettingsStore};
pub use state::ClockState;
