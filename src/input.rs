//! Input devices: arcade buttons, the rotary encoder and the gesture sensor.
//!
//! Devices are polled once per tick and report their last-known state. The
//! types here turn those raw readings into debounced, edge-triggered events.

use crate::error::ClockError;

use log::trace;
use std::time::Duration;

/// Number of arcade buttons on the button board.
pub const BUTTON_COUNT: usize = 2;

// =============================================================================
// Device Traits
// =============================================================================

/// The arcade button board.
pub trait ButtonPad {
    /// Whether each button is held down right now.
    fn read(&mut self) -> Result<[bool; BUTTON_COUNT], ClockError>;
}

/// The rotary encoder with its push button.
pub trait RotaryEncoder {
    /// Accumulated position. Wraps on overflow.
    fn position(&mut self) -> Result<i32, ClockError>;

    /// Whether the push button is held down right now.
    fn button_pressed(&mut self) -> Result<bool, ClockError>;
}

/// A sensor that classifies hand movements.
pub trait GestureSensor {
    /// The gesture seen since the last read, if any.
    fn gesture(&mut self) -> Result<Gesture, ClockError>;
}

/// A ranging sensor, such as an ultrasonic distance sensor.
pub trait DistanceSensor {
    /// Distance to the nearest object, or `None` when the echo timed out.
    fn distance_cm(&mut self) -> Result<Option<f32>, ClockError>;
}

/// Input devices that never report anything, for running without hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl ButtonPad for NoInput {
    fn read(&mut self) -> Result<[bool; BUTTON_COUNT], ClockError> {
        Ok([false; BUTTON_COUNT])
    }
}

impl RotaryEncoder for NoInput {
    fn position(&mut self) -> Result<i32, ClockError> {
        Ok(0)
    }

    fn button_pressed(&mut self) -> Result<bool, ClockError> {
        Ok(false)
    }
}

impl GestureSensor for NoInput {
    fn gesture(&mut self) -> Result<Gesture, ClockError> {
        Ok(Gesture::None)
    }
}

// =============================================================================
// Gestures
// =============================================================================

/// A classified hand movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    /// Nothing recognized.
    #[default]
    None,
    /// Upward swipe.
    Up,
    /// Downward swipe.
    Down,
    /// Right-to-left swipe.
    Left,
    /// Left-to-right swipe.
    Right,
}

impl Gesture {
    /// Decode the APDS9960 gesture register value.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Gesture::Up,
            0x02 => Gesture::Down,
            0x03 => Gesture::Left,
            0x04 => Gesture::Right,
            _ => Gesture::None,
        }
    }

    /// Whether this is a sideways wave, which snoozes and wakes.
    pub fn is_wave(self) -> bool {
        matches!(self, Gesture::Left | Gesture::Right)
    }
}

/// Treats anything close to a distance sensor as a wave.
///
/// Lets an ultrasonic sensor stand in for the gesture sensor.
#[derive(Debug)]
pub struct ProximityWave<S> {
    sensor: S,
    threshold_cm: f32,
}

impl<S: DistanceSensor> ProximityWave<S> {
    /// Default trigger distance.
    pub const DEFAULT_THRESHOLD_CM: f32 = 10.0;

    /// Wrap `sensor`, reporting a wave below `threshold_cm`.
    pub fn new(sensor: S, threshold_cm: f32) -> Self {
        Self {
            sensor,
            threshold_cm,
        }
    }
}

impl<S: DistanceSensor> GestureSensor for ProximityWave<S> {
    fn gesture(&mut self) -> Result<Gesture, ClockError> {
        match self.sensor.distance_cm()? {
            Some(distance) if distance < self.threshold_cm => {
                trace!("proximity wave at {distance:.1} cm");
                Ok(Gesture::Right)
            }
            _ => Ok(Gesture::None),
        }
    }
}

// =============================================================================
// Arcade Buttons
// =============================================================================

/// What an arcade button does outside of a ringing alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcadeButton {
    /// Yellow button: display settings.
    Display,
    /// White button: alarm settings.
    Alarm,
}

impl ArcadeButton {
    /// Button wired to board input `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ArcadeButton::Display),
            1 => Some(ArcadeButton::Alarm),
            _ => None,
        }
    }
}

/// Edge-triggered, per-button debouncing.
///
/// A press edge counts only if more than `interval` has passed since the
/// previous press edge on the same button. Every press edge restarts that
/// interval, so a chattering contact yields a single press.
#[derive(Debug, Clone)]
pub struct ButtonDebouncer {
    interval: Duration,
    held: [bool; BUTTON_COUNT],
    last_edge: [Option<Duration>; BUTTON_COUNT],
}

impl ButtonDebouncer {
    /// Create a debouncer with all buttons released.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            held: [false; BUTTON_COUNT],
            last_edge: [None; BUTTON_COUNT],
        }
    }

    /// Feed one reading taken at monotonic time `now`.
    ///
    /// Returns which buttons produced an accepted press.
    pub fn update(&mut self, pressed: [bool; BUTTON_COUNT], now: Duration) -> [bool; BUTTON_COUNT] {
        let mut accepted = [false; BUTTON_COUNT];
        for (index, &down) in pressed.iter().enumerate() {
            if down && !self.held[index] {
                accepted[index] = self.last_edge[index]
                    .is_none_or(|last| now.saturating_sub(last) > self.interval);
                if !accepted[index] {
                    trace!("button {index} bounce ignored");
                }
                self.last_edge[index] = Some(now);
            }
            self.held[index] = down;
        }
        accepted
    }
}

// =============================================================================
// Rotary Encoder
// =============================================================================

/// Direction the encoder knob turned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// Position increased.
    Clockwise,
    /// Position decreased.
    CounterClockwise,
}

/// Events from one encoder poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderEvents {
    /// Turn since the previous poll, however many detents it spanned.
    pub rotation: Option<Rotation>,
    /// Whether the push button went down since the previous poll.
    pub pressed: bool,
}

/// Turns encoder readings into rotation and press events.
#[derive(Debug, Clone, Default)]
pub struct EncoderTracker {
    last_position: Option<i32>,
    held: bool,
}

impl EncoderTracker {
    /// Create a tracker. The first reading only sets the baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reading.
    pub fn update(&mut self, position: i32, button_down: bool) -> EncoderEvents {
        let rotation = self.last_position.and_then(|last| {
            let delta = position.wrapping_sub(last);
            match delta.signum() {
                1 => Some(Rotation::Clockwise),
                -1 => Some(Rotation::CounterClockwise),
                _ => None,
            }
        });
        self.last_position = Some(position);

        let pressed = button_down && !self.held;
        self.held = button_down;

        EncoderEvents { rotation, pressed }
    }
}
