//! Display surfaces and the render cache in front of them.
//!
//! Every write to an LED backpack is a bus transaction, and rewriting the
//! same frame makes the segments flicker. [`Renderer`] remembers the last
//! frame pushed to each surface and only talks to the hardware when
//! something visible changed.

use crate::error::ClockError;
use crate::modes::DisplayMode;
use crate::settings::{ClockSettings, MAX_DIM_LEVEL};

use log::{error, info, trace};
use std::fmt;

// =============================================================================
// Display Surface Trait
// =============================================================================

/// A segmented LED display.
///
/// Setters only stage changes; [`DisplaySurface::flush`] sends them.
pub trait DisplaySurface {
    /// Blank the staged buffer.
    fn clear(&mut self);

    /// Stage content.
    fn set_content(&mut self, content: &Content);

    /// Stage brightness, `0.0..=1.0`.
    fn set_brightness(&mut self, brightness: f32);

    /// Stage the blinking colon.
    fn set_blink_indicator(&mut self, on: bool);

    /// Send the staged state to the device.
    fn flush(&mut self) -> Result<(), ClockError>;
}

/// What a surface shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Content {
    /// Nothing lit.
    #[default]
    Blank,
    /// A number, right-aligned.
    Number(u32),
    /// Up to four characters of text.
    Text(String),
}

impl Content {
    /// Text content.
    pub fn text(value: impl Into<String>) -> Self {
        Content::Text(value.into())
    }

    /// Whether this is [`Content::Blank`].
    pub fn is_blank(&self) -> bool {
        matches!(self, Content::Blank)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Blank => Ok(()),
            Content::Number(value) => write!(f, "{value}"),
            Content::Text(value) => f.write_str(value),
        }
    }
}

/// Everything visible on a surface at once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// What is shown.
    pub content: Content,
    /// Brightness, `0.0..=1.0`.
    pub brightness: f32,
    /// Colon state.
    pub blink: bool,
}

impl Frame {
    /// A dark frame.
    pub fn blank() -> Self {
        Self::default()
    }

    /// `content` at `brightness`, or a blank frame when the display is off.
    pub fn lit(content: Content, brightness: Option<f32>) -> Self {
        match brightness {
            Some(brightness) => Self {
                content,
                brightness,
                blink: false,
            },
            None => Self::blank(),
        }
    }
}

/// Brightness for a dim level: `level / 15`.
pub fn level_brightness(level: u8) -> f32 {
    f32::from(level.min(MAX_DIM_LEVEL)) / f32::from(MAX_DIM_LEVEL)
}

/// Brightness a mode calls for, or `None` when the displays are off.
pub fn mode_brightness(mode: DisplayMode, settings: &ClockSettings) -> Option<f32> {
    match mode {
        DisplayMode::AutoDim => Some(level_brightness(settings.auto_dim_level)),
        DisplayMode::ManualDim => Some(level_brightness(settings.manual_dim_level)),
        DisplayMode::ManualOff | DisplayMode::AutoOff => None,
    }
}

// =============================================================================
// Cached Surface
// =============================================================================

struct CachedSurface {
    label: &'static str,
    surface: Box<dyn DisplaySurface>,
    last: Option<Frame>,
}

impl CachedSurface {
    fn new(label: &'static str, surface: Box<dyn DisplaySurface>) -> Self {
        Self {
            label,
            surface,
            last: None,
        }
    }

    /// Push `frame` if it differs from the cached one. The blink state is
    /// staged on every call.
    fn show(&mut self, frame: Frame) {
        self.surface.set_blink_indicator(frame.blink);
        if self.last.as_ref() == Some(&frame) {
            return;
        }

        let redraw = self
            .last
            .as_ref()
            .is_none_or(|last| last.content != frame.content || last.brightness != frame.brightness);
        if redraw {
            self.surface.clear();
            if !frame.content.is_blank() {
                self.surface.set_content(&frame.content);
            }
            self.surface.set_brightness(frame.brightness);
        }

        match self.surface.flush() {
            Ok(()) => {
                trace!("{} <- {:?}", self.label, frame);
                self.last = Some(frame);
            }
            Err(e) => {
                error!("{} flush failed: {e}", self.label);
                self.last = None;
            }
        }
    }

    fn invalidate(&mut self) {
        self.last = None;
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Owns both displays and their caches.
pub struct Renderer {
    alpha: CachedSurface,
    numeric: CachedSurface,
}

impl Renderer {
    /// Take ownership of the alphanumeric and numeric surfaces.
    pub fn new(alpha: Box<dyn DisplaySurface>, numeric: Box<dyn DisplaySurface>) -> Self {
        Self {
            alpha: CachedSurface::new("alpha", alpha),
            numeric: CachedSurface::new("numeric", numeric),
        }
    }

    /// Show the time on the numeric display, blank when `brightness` is `None`.
    pub fn show_time(&mut self, number: u32, colon: bool, brightness: Option<f32>) {
        let frame = match brightness {
            Some(brightness) => Frame {
                content: Content::Number(number),
                brightness,
                blink: colon,
            },
            None => Frame::blank(),
        };
        self.numeric.show(frame);
    }

    /// Show a message on the alphanumeric display, blank when `brightness`
    /// is `None`.
    pub fn show_message(&mut self, content: Content, brightness: Option<f32>) {
        self.alpha.show(Frame::lit(content, brightness));
    }

    /// Blank the alphanumeric display.
    pub fn clear_message(&mut self) {
        self.alpha.show(Frame::blank());
    }

    /// Forget both cached frames so the next render is pushed.
    pub fn invalidate(&mut self) {
        self.alpha.invalidate();
        self.numeric.invalidate();
    }

    /// Blank both displays unconditionally.
    pub fn blank_all(&mut self) {
        self.invalidate();
        self.alpha.show(Frame::blank());
        self.numeric.show(Frame::blank());
    }
}

// =============================================================================
// Log Display
// =============================================================================

/// A surface that logs each flushed frame, for running without hardware.
#[derive(Debug)]
pub struct LogDisplay {
    label: &'static str,
    staged: Frame,
}

impl LogDisplay {
    /// Create a surface that logs under `label`.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            staged: Frame::blank(),
        }
    }
}

impl DisplaySurface for LogDisplay {
    fn clear(&mut self) {
        self.staged.content = Content::Blank;
    }

    fn set_content(&mut self, content: &Content) {
        self.staged.content = content.clone();
    }

    fn set_brightness(&mut self, brightness: f32) {
        self.staged.brightness = brightness;
    }

    fn set_blink_indicator(&mut self, on: bool) {
        self.staged.blink = on;
    }

    fn flush(&mut self) -> Result<(), ClockError> {
        let colon = if self.staged.blink { ":" } else { " " };
        info!(
            "[{}{}] {:>4} @ {:.2}",
            self.label, colon, self.staged.content, self.staged.brightness
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDisplay;

    fn renderer() -> (Renderer, MockDisplay, MockDisplay) {
        let alpha = MockDisplay::new();
        let numeric = MockDisplay::new();
        let renderer = Renderer::new(Box::new(alpha.clone()), Box::new(numeric.clone()));
        (renderer, alpha, numeric)
    }

    #[test]
    fn test_identical_frames_flush_once() {
        let (mut renderer, _, numeric) = renderer();
        renderer.show_time(642, true, Some(0.4));
        renderer.show_time(642, true, Some(0.4));
        assert_eq!(numeric.flushes(), 1);
        assert_eq!(numeric.content(), Content::Number(642));
    }

    #[test]
    fn test_blink_change_always_flushes() {
        let (mut renderer, _, numeric) = renderer();
        renderer.show_time(642, true, Some(0.4));
        renderer.show_time(642, false, Some(0.4));
        assert_eq!(numeric.flushes(), 2);
        assert!(!numeric.blink());
        // Only the colon changed; the digits were not rewritten.
        assert_eq!(numeric.content_writes(), 1);
    }

    #[test]
    fn test_brightness_change_redraws() {
        let (mut renderer, _, numeric) = renderer();
        renderer.show_time(642, false, Some(0.4));
        renderer.show_time(642, false, Some(1.0));
        assert_eq!(numeric.flushes(), 2);
        assert_eq!(numeric.brightness(), 1.0);
    }

    #[test]
    fn test_content_kind_is_part_of_the_cache() {
        let (mut renderer, alpha, _) = renderer();
        renderer.show_message(Content::Number(6), Some(0.4));
        renderer.show_message(Content::text("6"), Some(0.4));
        assert_eq!(alpha.flushes(), 2);
    }

    #[test]
    fn test_off_mode_blanks_once() {
        let (mut renderer, alpha, numeric) = renderer();
        renderer.show_time(700, true, Some(0.4));
        renderer.show_message(Content::text("ON"), Some(0.4));
        for _ in 0..3 {
            renderer.show_time(700, true, None);
            renderer.show_message(Content::text("ON"), None);
        }
        assert_eq!(numeric.flushes(), 2);
        assert_eq!(alpha.flushes(), 2);
        assert_eq!(numeric.content(), Content::Blank);
        assert_eq!(alpha.content(), Content::Blank);
    }

    #[test]
    fn test_invalidate_forces_redraw() {
        let (mut renderer, alpha, numeric) = renderer();
        renderer.show_time(700, true, Some(0.4));
        renderer.clear_message();
        renderer.invalidate();
        renderer.show_time(700, true, Some(0.4));
        renderer.clear_message();
        assert_eq!(numeric.flushes(), 2);
        assert_eq!(alpha.flushes(), 2);
    }

    #[test]
    fn test_failed_flush_retries_next_time() {
        let (mut renderer, _, numeric) = renderer();
        numeric.fail_next_flush();
        renderer.show_time(700, true, Some(0.4));
        renderer.show_time(700, true, Some(0.4));
        renderer.show_time(700, true, Some(0.4));
        assert_eq!(numeric.flush_attempts(), 2);
        assert_eq!(numeric.flushes(), 1);
    }

    #[test]
    fn test_mode_brightness() {
        let settings = ClockSettings {
            manual_dim_level: 15,
            auto_dim_level: 3,
            ..Default::default()
        };
        assert_eq!(mode_brightness(DisplayMode::ManualDim, &settings), Some(1.0));
        assert_eq!(mode_brightness(DisplayMode::AutoDim, &settings), Some(0.2));
        assert_eq!(mode_brightness(DisplayMode::AutoOff, &settings), None);
        assert_eq!(level_brightness(0), 0.0);
    }
}
