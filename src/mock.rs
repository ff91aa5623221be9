//! Mock devices for testing.
//!
//! Each mock is a cheap handle onto shared state: hand one clone to
//! [`AlarmClock`](crate::AlarmClock) and keep another to drive inputs and
//! inspect outputs.

use crate::audio::AlarmAudio;
use crate::clock::TimeSource;
use crate::display::{Content, DisplaySurface, Frame};
use crate::error::ClockError;
use crate::input::{BUTTON_COUNT, ButtonPad, Gesture, GestureSensor, RotaryEncoder};
use crate::settings::{ClockSettings, SettingsStore};

use chrono::{NaiveDateTime, TimeDelta};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Clock
// =============================================================================

#[derive(Debug)]
struct ClockInner {
    now: NaiveDateTime,
    monotonic: Duration,
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct MockClock {
    inner: Arc<Mutex<ClockInner>>,
}

impl MockClock {
    /// Create a clock reading `now`, with the monotonic clock at zero.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner {
                now,
                monotonic: Duration::ZERO,
            })),
        }
    }

    /// Move both clocks forward.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.monotonic += by;
        inner.now += TimeDelta::from_std(by).unwrap();
    }

    /// Jump the wall clock without touching the monotonic clock.
    pub fn set_now(&self, now: NaiveDateTime) {
        self.inner.lock().unwrap().now = now;
    }
}

impl TimeSource for MockClock {
    fn now(&self) -> NaiveDateTime {
        self.inner.lock().unwrap().now
    }

    fn monotonic(&self) -> Duration {
        self.inner.lock().unwrap().monotonic
    }
}

// =============================================================================
// Display
// =============================================================================

#[derive(Debug, Default)]
struct DisplayInner {
    staged: Frame,
    shown: Frame,
    flushes: usize,
    flush_attempts: usize,
    content_writes: usize,
    fail_next: bool,
}

/// A display that records what reached the hardware.
#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    inner: Arc<Mutex<DisplayInner>>,
}

impl MockDisplay {
    /// Create a blank display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content as of the last successful flush.
    pub fn content(&self) -> Content {
        self.inner.lock().unwrap().shown.content.clone()
    }

    /// Brightness as of the last successful flush.
    pub fn brightness(&self) -> f32 {
        self.inner.lock().unwrap().shown.brightness
    }

    /// Colon as of the last successful flush.
    pub fn blink(&self) -> bool {
        self.inner.lock().unwrap().shown.blink
    }

    /// Successful flushes.
    pub fn flushes(&self) -> usize {
        self.inner.lock().unwrap().flushes
    }

    /// All flushes, failed ones included.
    pub fn flush_attempts(&self) -> usize {
        self.inner.lock().unwrap().flush_attempts
    }

    /// Calls to `set_content`.
    pub fn content_writes(&self) -> usize {
        self.inner.lock().unwrap().content_writes
    }

    /// Make the next flush fail.
    pub fn fail_next_flush(&self) {
        self.inner.lock().unwrap().fail_next = true;
    }
}

impl DisplaySurface for MockDisplay {
    fn clear(&mut self) {
        self.inner.lock().unwrap().staged.content = Content::Blank;
    }

    fn set_content(&mut self, content: &Content) {
        let mut inner = self.inner.lock().unwrap();
        inner.staged.content = content.clone();
        inner.content_writes += 1;
    }

    fn set_brightness(&mut self, brightness: f32) {
        self.inner.lock().unwrap().staged.brightness = brightness;
    }

    fn set_blink_indicator(&mut self, on: bool) {
        self.inner.lock().unwrap().staged.blink = on;
    }

    fn flush(&mut self) -> Result<(), ClockError> {
        let mut inner = self.inner.lock().unwrap();
        inner.flush_attempts += 1;
        if std::mem::take(&mut inner.fail_next) {
            return Err(ClockError::Display {
                surface: "mock",
                reason: "bus error".to_string(),
            });
        }
        inner.shown = inner.staged.clone();
        inner.flushes += 1;
        Ok(())
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Arcade buttons held down or released by the test.
#[derive(Debug, Clone, Default)]
pub struct MockButtons {
    held: Arc<Mutex<[bool; BUTTON_COUNT]>>,
}

impl MockButtons {
    /// Create a pad with every button released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold button `index` down.
    pub fn press(&self, index: usize) {
        self.held.lock().unwrap()[index] = true;
    }

    /// Release button `index`.
    pub fn release(&self, index: usize) {
        self.held.lock().unwrap()[index] = false;
    }
}

impl ButtonPad for MockButtons {
    fn read(&mut self) -> Result<[bool; BUTTON_COUNT], ClockError> {
        Ok(*self.held.lock().unwrap())
    }
}

#[derive(Debug, Default)]
struct EncoderInner {
    position: i32,
    button: bool,
    fail: bool,
}

/// An encoder turned and pressed by the test.
#[derive(Debug, Clone, Default)]
pub struct MockEncoder {
    inner: Arc<Mutex<EncoderInner>>,
}

impl MockEncoder {
    /// Create an encoder at position zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn by `detents`; negative is counter-clockwise.
    pub fn turn(&self, detents: i32) {
        let mut inner = self.inner.lock().unwrap();
        inner.position = inner.position.wrapping_add(detents);
    }

    /// Hold or release the push button.
    pub fn set_button(&self, down: bool) {
        self.inner.lock().unwrap().button = down;
    }

    /// Make reads fail until cleared.
    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().unwrap().fail = fail;
    }
}

impl RotaryEncoder for MockEncoder {
    fn position(&mut self) -> Result<i32, ClockError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail {
            return Err(ClockError::Sensor("encoder"));
        }
        Ok(inner.position)
    }

    fn button_pressed(&mut self) -> Result<bool, ClockError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail {
            return Err(ClockError::Sensor("encoder"));
        }
        Ok(inner.button)
    }
}

/// A gesture sensor fed from a queue; each gesture is reported once.
#[derive(Debug, Clone, Default)]
pub struct MockGesture {
    queue: Arc<Mutex<VecDeque<Gesture>>>,
}

impl MockGesture {
    /// Create a sensor with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `gesture` on the next read.
    pub fn push(&self, gesture: Gesture) {
        self.queue.lock().unwrap().push_back(gesture);
    }
}

impl GestureSensor for MockGesture {
    fn gesture(&mut self) -> Result<Gesture, ClockError> {
        Ok(self.queue.lock().unwrap().pop_front().unwrap_or_default())
    }
}

// =============================================================================
// Store and Audio
// =============================================================================

#[derive(Debug, Default)]
struct StoreInner {
    json: Option<String>,
    saves: usize,
}

/// A settings store kept in memory in the on-disk JSON format.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `settings`.
    pub fn with_settings(settings: &ClockSettings) -> Self {
        let store = Self::new();
        store.save(settings).unwrap();
        store.inner.lock().unwrap().saves = 0;
        store
    }

    /// Create a store holding raw file contents.
    pub fn with_json(json: impl Into<String>) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().json = Some(json.into());
        store
    }

    /// Number of saves so far.
    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap().saves
    }

    /// The settings as last saved.
    pub fn saved(&self) -> Option<ClockSettings> {
        self.load().unwrap()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<ClockSettings>, ClockError> {
        let json = self.inner.lock().unwrap().json.clone();
        json.map(|json| ClockSettings::from_json(&json)).transpose()
    }

    fn save(&self, settings: &ClockSettings) -> Result<(), ClockError> {
        let json = settings.to_json()?;
        let mut inner = self.inner.lock().unwrap();
        inner.json = Some(json);
        inner.saves += 1;
        Ok(())
    }
}

/// Something the audio backend was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    /// `set_volume(level)`.
    Volume(u8),
    /// `play_track(track)`.
    Play(u8),
}

/// An audio backend that records calls.
#[derive(Debug, Clone, Default)]
pub struct MockAudio {
    calls: Arc<Mutex<Vec<AudioCall>>>,
}

impl MockAudio {
    /// Create a backend with no calls recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far.
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl AlarmAudio for MockAudio {
    fn set_volume(&mut self, level: u8) {
        self.calls.lock().unwrap().push(AudioCall::Volume(level));
    }

    fn play_track(&mut self, track: u8) {
        self.calls.lock().unwrap().push(AudioCall::Play(track));
    }
}
