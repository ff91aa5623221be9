//! The alarm clock control loop.

use crate::alarm::{AlarmEngine, AlarmTransition};
use crate::audio::AlarmAudio;
use crate::clock::{self, TimeSource};
use crate::config::ClockConfig;
use crate::display::{self, Content, DisplaySurface, Renderer};
use crate::error::ClockError;
use crate::input::{
    ArcadeButton, ButtonDebouncer, ButtonPad, EncoderTracker, Gesture, GestureSensor,
    RotaryEncoder, Rotation,
};
use crate::modes::{DisplayMode, ModeInputs, resolve_mode};
use crate::nav::{self, AlarmEdit, AlarmSlot, ConfigMode, DisplaySlot};
use crate::settings::{self, ClockSettings, SettingsStore};
use crate::state::ClockState;

use chrono::NaiveDateTime;
use log::{debug, error, info, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// The hardware the clock talks to.
///
/// Every field is a capability trait object so tests can substitute the
/// [`mock`](crate::mock) devices.
pub struct Devices {
    /// 14-segment x4 display for messages and settings.
    pub alpha: Box<dyn DisplaySurface>,
    /// 7-segment x4 display for the time.
    pub numeric: Box<dyn DisplaySurface>,
    /// Arcade buttons.
    pub buttons: Box<dyn ButtonPad>,
    /// Rotary encoder.
    pub encoder: Box<dyn RotaryEncoder>,
    /// Gesture sensor.
    pub gesture: Box<dyn GestureSensor>,
    /// Time source.
    pub clock: Box<dyn TimeSource>,
    /// Settings persistence.
    pub store: Box<dyn SettingsStore>,
    /// Alarm audio.
    pub audio: Box<dyn AlarmAudio>,
}

/// The alarm clock.
///
/// Call [`AlarmClock::tick`] at [`AlarmClock::tick_interval`], or let
/// [`AlarmClock::run`] do it. One tick reads the time, resolves the display
/// mode, polls the gesture sensor, renders, checks the alarm and polls the
/// encoder and buttons, in that order.
pub struct AlarmClock {
    config: ClockConfig,
    settings: ClockSettings,
    clock: Box<dyn TimeSource>,
    store: Box<dyn SettingsStore>,
    buttons: Box<dyn ButtonPad>,
    encoder: Box<dyn RotaryEncoder>,
    gesture: Box<dyn GestureSensor>,
    audio: Box<dyn AlarmAudio>,
    renderer: Renderer,
    engine: AlarmEngine,
    nav: ConfigMode,
    debouncer: ButtonDebouncer,
    encoder_tracker: EncoderTracker,
    wake_until: Option<Duration>,
}

impl AlarmClock {
    /// Create a clock, loading settings from the store.
    ///
    /// A missing or unreadable store leaves the defaults in place.
    pub fn new(config: ClockConfig, devices: Devices) -> Self {
        let settings = settings::load_or_default(devices.store.as_ref());
        info!(
            "alarm {:02}:{:02} {} ({}), display {}",
            settings.alarm_hour,
            settings.alarm_minute,
            settings.period,
            if settings.alarm_enabled { "on" } else { "off" },
            settings.display_mode
        );

        Self {
            engine: AlarmEngine::new(config.alarm, settings.fire_time()),
            debouncer: ButtonDebouncer::new(config.debounce),
            renderer: Renderer::new(devices.alpha, devices.numeric),
            encoder_tracker: EncoderTracker::new(),
            nav: ConfigMode::Idle,
            wake_until: None,
            clock: devices.clock,
            store: devices.store,
            buttons: devices.buttons,
            encoder: devices.encoder,
            gesture: devices.gesture,
            audio: devices.audio,
            settings,
            config,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// A snapshot of the runtime state.
    pub fn state(&self) -> ClockState {
        ClockState {
            display_mode: self.settings.display_mode,
            effective_mode: self.effective_mode(),
            config_mode: self.nav,
            alarm: self.engine.status(),
            fire_time: self.engine.fire_time(),
            woken: self.wake_until.is_some(),
        }
    }

    /// How long to sleep before the next tick.
    pub fn tick_interval(&self) -> Duration {
        if self.engine.is_ringing() {
            self.config.ring_poll_interval
        } else {
            self.config.tick_interval
        }
    }

    /// Run one pass of the control loop.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let monotonic = self.clock.monotonic();

        self.settings.display_mode = resolve_mode(
            &self.config.bands,
            &ModeInputs {
                auto_dim: self.settings.auto_dim,
                alarm_enabled: self.settings.alarm_enabled,
                current: self.settings.display_mode,
                now: now.time(),
                fire_time: self.engine.fire_time(),
                override_on: self.settings.display_override,
            },
        );

        let gesture = self.read_gesture();
        if gesture.is_wave() {
            self.on_wave(monotonic);
        }
        if self.wake_until.is_some_and(|until| monotonic >= until) {
            debug!("wave wake over");
            self.wake_until = None;
        }

        self.render(now);

        if let Some(transition) = self.engine.check(now, monotonic, &self.settings) {
            self.on_transition(transition);
        }
        if let Some(volume) = self.engine.ring_tick(monotonic, self.settings.vol_level) {
            self.audio.set_volume(volume);
            self.audio.play_track(self.settings.alarm_track);
        }

        self.poll_encoder(monotonic);
        self.poll_buttons(monotonic);
    }

    /// Tick until `stop` is set, then blank the displays.
    pub fn run(&mut self, stop: &AtomicBool) {
        info!("clock running");
        while !stop.load(Ordering::SeqCst) {
            self.tick();
            std::thread::sleep(self.tick_interval());
        }
        self.shutdown();
    }

    /// Blank both displays.
    pub fn shutdown(&mut self) {
        info!("shutting down, blanking displays");
        self.renderer.blank_all();
    }

    fn effective_mode(&self) -> DisplayMode {
        if self.wake_until.is_some() {
            DisplayMode::AutoDim
        } else {
            self.settings.display_mode
        }
    }

    fn save_settings(&self) {
        if let Err(e) = self.store.save(&self.settings) {
            error!("failed to save settings: {e}");
        }
    }

    fn read_gesture(&mut self) -> Gesture {
        match self.gesture.gesture() {
            Ok(gesture) => gesture,
            Err(e) => {
                trace!("gesture read failed: {e}");
                Gesture::None
            }
        }
    }

    fn on_wave(&mut self, monotonic: Duration) {
        if self.engine.is_ringing() {
            if let Some(transition) = self.engine.snooze(monotonic) {
                self.on_transition(transition);
            }
        } else if self.wake_until.is_none()
            && !self.settings.display_override
            && self.settings.display_mode.is_off()
        {
            debug!("wave wake for {:?}", self.config.wake_duration);
            self.wake_until = Some(monotonic + self.config.wake_duration);
        }
    }

    fn on_transition(&mut self, transition: AlarmTransition) {
        debug!("alarm transition: {transition:?}");
        match transition {
            AlarmTransition::StartedRinging => {
                self.wake_until = None;
                self.renderer.invalidate();
            }
            AlarmTransition::Snoozed => {
                self.renderer.clear_message();
            }
            AlarmTransition::Dismissed => {
                self.renderer.invalidate();
                self.save_settings();
            }
            AlarmTransition::CooldownElapsed => {}
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn render(&mut self, now: NaiveDateTime) {
        let number = clock::display_number(&now);
        let colon = clock::colon_on(&now);
        let brightness = display::mode_brightness(self.effective_mode(), &self.settings);

        if self.engine.is_ringing() {
            let brightness = brightness
                .unwrap_or_else(|| display::level_brightness(self.settings.manual_dim_level));
            self.renderer.show_message(Content::text("RING"), Some(brightness));
            self.renderer.show_time(number, colon, Some(brightness));
            return;
        }

        self.renderer.show_time(number, colon, brightness);
        match self.nav {
            ConfigMode::Idle => self.renderer.clear_message(),
            ConfigMode::Alarm(slot) => {
                let content = self.alarm_slot_content(slot);
                self.renderer.show_message(content, brightness);
            }
            ConfigMode::Display(slot) => {
                let content = self.display_slot_content(slot);
                self.renderer.show_message(content, brightness);
            }
        }
    }

    fn alarm_slot_content(&self, slot: AlarmSlot) -> Content {
        match slot {
            AlarmSlot::Hour | AlarmSlot::Minute => {
                Content::Number(self.settings.alarm_display_number())
            }
            AlarmSlot::Period => Content::text(self.settings.period.label()),
            AlarmSlot::Enabled => on_off(self.settings.alarm_enabled),
            AlarmSlot::Track => Content::Number(self.settings.alarm_track.into()),
            AlarmSlot::Volume => Content::Number(self.settings.vol_level.into()),
        }
    }

    fn display_slot_content(&self, slot: DisplaySlot) -> Content {
        match slot {
            DisplaySlot::DimLevel => Content::Number(self.settings.manual_dim_level.into()),
            DisplaySlot::Override => on_off(self.settings.display_override),
        }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    fn poll_buttons(&mut self, monotonic: Duration) {
        let held = match self.buttons.read() {
            Ok(held) => held,
            Err(e) => {
                trace!("button read failed: {e}");
                return;
            }
        };

        let accepted = self.debouncer.update(held, monotonic);
        if !accepted.contains(&true) {
            return;
        }

        // While the alarm is active every press in this poll is a dismiss.
        if self.engine.is_active() {
            if let Some(transition) = self.engine.dismiss(&mut self.settings) {
                self.on_transition(transition);
            }
            return;
        }

        for (index, _) in accepted.iter().enumerate().filter(|(_, hit)| **hit) {
            match ArcadeButton::from_index(index) {
                Some(ArcadeButton::Display) => {
                    self.nav.toggle_display();
                    if matches!(self.nav, ConfigMode::Display(_)) {
                        self.save_settings();
                    }
                }
                Some(ArcadeButton::Alarm) => self.nav.toggle_alarm(),
                None => continue,
            }
            info!("settings screen: {:?}", self.nav);
            self.renderer.invalidate();
        }
    }

    fn poll_encoder(&mut self, monotonic: Duration) {
        let (position, button) = match self.read_encoder() {
            Ok(reading) => reading,
            Err(e) => {
                trace!("encoder read failed: {e}");
                return;
            }
        };

        let events = self.encoder_tracker.update(position, button);
        if let Some(rotation) = events.rotation {
            self.on_rotation(rotation, monotonic);
        }
        if events.pressed {
            self.on_encoder_press(monotonic);
        }
    }

    fn read_encoder(&mut self) -> Result<(i32, bool), ClockError> {
        let position = self.encoder.position()?;
        Ok((position, self.encoder.button_pressed()?))
    }

    fn on_rotation(&mut self, rotation: Rotation, monotonic: Duration) {
        match self.nav {
            ConfigMode::Idle => return,
            ConfigMode::Alarm(slot) => {
                let edit = nav::rotate_alarm(slot, rotation, &mut self.settings);
                self.apply_alarm_edit(edit);
            }
            ConfigMode::Display(slot) => {
                nav::rotate_display(slot, rotation, &mut self.settings);
                if !self.engine.is_ringing() && self.settings.display_mode.is_off() {
                    info!("display woken from settings, override on");
                    self.settings.display_override = true;
                    self.settings.display_mode = DisplayMode::ManualDim;
                    self.nav = ConfigMode::Idle;
                    self.renderer.invalidate();
                } else if self.engine.is_active() {
                    self.nudge_alarm(monotonic);
                }
            }
        }
        self.save_settings();
    }

    fn on_encoder_press(&mut self, monotonic: Duration) {
        if matches!(self.nav, ConfigMode::Display(_)) && self.engine.is_active() {
            self.nudge_alarm(monotonic);
            self.save_settings();
        } else if self.nav.advance_slot() {
            self.save_settings();
        }
    }

    fn nudge_alarm(&mut self, monotonic: Duration) {
        if let Some(transition) = self.engine.nudge(monotonic, &mut self.settings) {
            self.on_transition(transition);
        }
    }

    fn apply_alarm_edit(&mut self, edit: AlarmEdit) {
        match edit {
            AlarmEdit::Time => self.engine.set_fire_time(self.settings.fire_time()),
            AlarmEdit::Enabled => self.engine.reset(self.settings.fire_time()),
            AlarmEdit::Track => self.audio.play_track(self.settings.alarm_track),
            AlarmEdit::Volume => {
                self.audio.set_volume(self.settings.vol_level);
                self.audio.play_track(self.settings.alarm_track);
            }
        }
    }
}

fn on_off(value: bool) -> Content {
    Content::text(if value { "ON" } else { "OFF" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmStatus;
    use crate::mock::{
        MemoryStore, MockAudio, MockButtons, MockClock, MockDisplay, MockEncoder, MockGesture,
    };
    use crate::settings::Period;
    use chrono::{NaiveDate, NaiveTime};

    struct Rig {
        clock: AlarmClock,
        time: MockClock,
        alpha: MockDisplay,
        numeric: MockDisplay,
        buttons: MockButtons,
        encoder: MockEncoder,
        gesture: MockGesture,
        store: MemoryStore,
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn rig(now: NaiveDateTime, settings: ClockSettings) -> Rig {
        let time = MockClock::new(now);
        let alpha = MockDisplay::new();
        let numeric = MockDisplay::new();
        let buttons = MockButtons::new();
        let encoder = MockEncoder::new();
        let gesture = MockGesture::new();
        let store = MemoryStore::with_settings(&settings);
        let clock = AlarmClock::new(
            ClockConfig::default(),
            Devices {
                alpha: Box::new(alpha.clone()),
                numeric: Box::new(numeric.clone()),
                buttons: Box::new(buttons.clone()),
                encoder: Box::new(encoder.clone()),
                gesture: Box::new(gesture.clone()),
                clock: Box::new(time.clone()),
                store: Box::new(store.clone()),
                audio: Box::new(MockAudio::new()),
            },
        );
        Rig {
            clock,
            time,
            alpha,
            numeric,
            buttons,
            encoder,
            gesture,
            store,
        }
    }

    impl Rig {
        fn step(&mut self) {
            self.clock.tick();
            self.time.advance(Duration::from_millis(50));
        }

        fn click(&mut self, button: usize) {
            self.buttons.press(button);
            self.step();
            self.buttons.release(button);
            self.time.advance(Duration::from_millis(300));
            self.step();
        }

        fn press_encoder(&mut self) {
            self.encoder.set_button(true);
            self.step();
            self.encoder.set_button(false);
            self.step();
        }
    }

    #[test]
    fn test_idle_tick_shows_time() {
        let mut rig = rig(at(9, 41, 1), ClockSettings::default());
        rig.step();
        assert_eq!(rig.numeric.content(), Content::Number(941));
        assert!(rig.numeric.blink());
        assert_eq!(rig.numeric.brightness(), 6.0 / 15.0);
        assert_eq!(rig.alpha.content(), Content::Blank);
        assert_eq!(rig.clock.state().display_mode, DisplayMode::ManualDim);
    }

    #[test]
    fn test_alarm_button_opens_alarm_screen() {
        let mut rig = rig(at(9, 0, 0), ClockSettings::default());
        rig.step();
        rig.click(1);
        assert_eq!(rig.clock.state().config_mode, ConfigMode::Alarm(AlarmSlot::Hour));
        assert_eq!(rig.alpha.content(), Content::Number(400));

        rig.encoder.turn(1);
        rig.step();
        assert_eq!(rig.clock.settings().alarm_hour, 5);
        rig.step();
        assert_eq!(rig.alpha.content(), Content::Number(500));
        assert_eq!(
            rig.clock.state().fire_time,
            NaiveTime::from_hms_opt(5, 0, 0).unwrap()
        );
        assert_eq!(rig.store.saved().unwrap().alarm_hour, 5);

        rig.press_encoder();
        rig.press_encoder();
        assert_eq!(rig.clock.state().config_mode, ConfigMode::Alarm(AlarmSlot::Period));
        assert_eq!(rig.alpha.content(), Content::text("AM"));

        rig.click(0);
        assert_eq!(
            rig.clock.state().config_mode,
            ConfigMode::Display(DisplaySlot::DimLevel)
        );
        rig.click(0);
        assert_eq!(rig.clock.state().config_mode, ConfigMode::Idle);
        assert_eq!(rig.alpha.content(), Content::Blank);
    }

    #[test]
    fn test_rotation_when_idle_does_nothing() {
        let mut rig = rig(at(9, 0, 0), ClockSettings::default());
        rig.step();
        rig.encoder.turn(3);
        rig.step();
        assert_eq!(rig.clock.settings(), &ClockSettings::default());
        assert_eq!(rig.store.saves(), 0);
    }

    #[test]
    fn test_encoder_fault_is_no_event() {
        let mut rig = rig(at(9, 0, 0), ClockSettings::default());
        rig.step();
        rig.click(1);

        rig.encoder.set_failing(true);
        rig.encoder.turn(1);
        rig.step();
        assert_eq!(rig.clock.settings().alarm_hour, 4);
        assert_eq!(rig.store.saves(), 0);

        // The turn is picked up once reads work again.
        rig.encoder.set_failing(false);
        rig.step();
        assert_eq!(rig.clock.settings().alarm_hour, 5);
    }

    #[test]
    fn test_button_dismisses_ringing_alarm() {
        let settings = ClockSettings {
            alarm_hour: 6,
            alarm_minute: 30,
            alarm_enabled: true,
            ..Default::default()
        };
        let mut rig = rig(at(6, 29, 59), settings);
        rig.step();
        rig.time.advance(Duration::from_secs(1));
        rig.step();
        rig.step();
        assert_eq!(rig.clock.state().alarm, AlarmStatus::Ringing);
        assert_eq!(rig.alpha.content(), Content::text("RING"));
        assert_eq!(rig.clock.tick_interval(), Duration::from_millis(100));

        rig.click(1);
        assert_eq!(rig.clock.state().alarm, AlarmStatus::Idle);
        assert_eq!(rig.clock.state().config_mode, ConfigMode::Idle);
        assert!(!rig.clock.settings().alarm_enabled);
        assert!(!rig.store.saved().unwrap().alarm_enabled);
        assert_eq!(rig.alpha.content(), Content::Blank);
    }

    #[test]
    fn test_wave_snoozes_ringing_alarm() {
        let settings = ClockSettings {
            alarm_hour: 6,
            alarm_minute: 30,
            alarm_enabled: true,
            ..Default::default()
        };
        let mut rig = rig(at(6, 30, 0), settings);
        rig.step();
        assert_eq!(rig.clock.state().alarm, AlarmStatus::Ringing);

        rig.gesture.push(Gesture::Left);
        rig.step();
        let state = rig.clock.state();
        assert_eq!(state.alarm, AlarmStatus::Cooldown);
        assert_eq!(state.fire_time, NaiveTime::from_hms_opt(6, 35, 0).unwrap());
    }

    #[test]
    fn test_wave_wakes_dark_display() {
        let settings = ClockSettings {
            display_override: false,
            auto_dim_level: 3,
            ..Default::default()
        };
        let mut rig = rig(at(3, 0, 0), settings);
        rig.step();
        assert_eq!(rig.clock.state().display_mode, DisplayMode::AutoOff);
        assert_eq!(rig.numeric.content(), Content::Blank);

        rig.gesture.push(Gesture::Right);
        rig.step();
        assert!(rig.clock.state().woken);
        assert_eq!(rig.numeric.content(), Content::Number(300));
        assert_eq!(rig.numeric.brightness(), 0.2);

        rig.time.advance(Duration::from_secs(5));
        rig.step();
        assert!(!rig.clock.state().woken);
        assert_eq!(rig.numeric.content(), Content::Blank);
    }

    #[test]
    fn test_display_rotation_while_dark_turns_override_on() {
        let settings = ClockSettings {
            display_override: false,
            ..Default::default()
        };
        let mut rig = rig(at(3, 0, 0), settings);
        rig.step();
        rig.click(0);
        rig.encoder.turn(1);
        rig.step();
        // The dim level forces MANUAL_DIM, so the screen stays open.
        assert_eq!(rig.clock.settings().manual_dim_level, 7);
        assert_eq!(rig.clock.state().config_mode, ConfigMode::Display(DisplaySlot::DimLevel));

        rig.press_encoder();
        rig.encoder.turn(1);
        rig.step();
        assert!(rig.clock.settings().display_override);
        assert_eq!(rig.clock.state().config_mode, ConfigMode::Idle);

        rig.step();
        assert_eq!(rig.clock.state().display_mode, DisplayMode::ManualDim);
        assert_eq!(rig.numeric.content(), Content::Number(300));
    }

    #[test]
    fn test_shutdown_blanks_both_displays() {
        let settings = ClockSettings {
            period: Period::Pm,
            ..Default::default()
        };
        let mut rig = rig(at(9, 0, 0), settings);
        rig.step();
        rig.clock.shutdown();
        assert_eq!(rig.numeric.content(), Content::Blank);
        assert_eq!(rig.alpha.content(), Content::Blank);
    }

    #[test]
    fn test_run_stops_when_flag_set() {
        let mut rig = rig(at(9, 0, 0), ClockSettings::default());
        let stop = AtomicBool::new(true);
        rig.clock.run(&stop);
        assert_eq!(rig.numeric.content(), Content::Blank);
    }
}
