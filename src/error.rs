//! Error types for the alarm clock.

/// Errors that can occur while driving the alarm clock.
///
/// None of these are fatal to the control loop: callers log them and carry on
/// with the state they already have.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// An I/O error occurred (e.g., reading or writing the settings file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file could not be parsed or serialized.
    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting value was outside the valid range.
    #[error("Invalid value {value} for {name} (expected {min}-{max})")]
    InvalidSetting {
        /// The setting name.
        name: &'static str,
        /// The invalid value provided.
        value: i64,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
    },

    /// A time string was not in `HH:MM` 24-hour form.
    #[error("Invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    /// A display surface rejected a write or flush.
    #[error("Display '{surface}' fault: {reason}")]
    Display {
        /// Which surface failed.
        surface: &'static str,
        /// Driver-supplied description.
        reason: String,
    },

    /// A sensor read failed or timed out.
    #[error("Sensor '{0}' read failed")]
    Sensor(&'static str),

    /// The audio backend could not be started.
    #[error("Audio error: {0}")]
    Audio(String),
}
