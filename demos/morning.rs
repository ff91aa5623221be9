//! Example: a scripted morning on mock hardware.
//!
//! Run with: `RUST_LOG=info cargo run --example morning`

use aclock::mock::{
    MemoryStore, MockAudio, MockButtons, MockClock, MockDisplay, MockEncoder, MockGesture,
};
use aclock::{AlarmClock, AlarmStatus, ClockConfig, ClockSettings, Devices, Gesture};
use chrono::NaiveDate;
use std::time::Duration;

fn main() {
    // Initialize logging (optional)
    env_logger::init();

    let settings = ClockSettings {
        alarm_hour: 6,
        alarm_minute: 30,
        alarm_enabled: true,
        ..Default::default()
    };
    let Some(start) = NaiveDate::from_ymd_opt(2025, 6, 5).and_then(|d| d.and_hms_opt(6, 29, 50))
    else {
        return;
    };

    let time = MockClock::new(start);
    let alpha = MockDisplay::new();
    let numeric = MockDisplay::new();
    let buttons = MockButtons::new();
    let gesture = MockGesture::new();
    let audio = MockAudio::new();
    let mut clock = AlarmClock::new(
        ClockConfig::default(),
        Devices {
            alpha: Box::new(alpha.clone()),
            numeric: Box::new(numeric.clone()),
            buttons: Box::new(buttons.clone()),
            encoder: Box::new(MockEncoder::new()),
            gesture: Box::new(gesture.clone()),
            clock: Box::new(time.clone()),
            store: Box::new(MemoryStore::with_settings(&settings)),
            audio: Box::new(audio.clone()),
        },
    );

    let run_for = |clock: &mut AlarmClock, duration: Duration| {
        let mut elapsed = Duration::ZERO;
        while elapsed < duration {
            clock.tick();
            let step = clock.tick_interval();
            time.advance(step);
            elapsed += step;
        }
    };

    // Sleep through the last seconds before the alarm.
    run_for(&mut clock, Duration::from_secs(15));
    println!("06:30 -> {:?}, alpha shows {}", clock.state().alarm, alpha.content());

    // Wave at the sensor: snooze for five minutes.
    gesture.push(Gesture::Left);
    run_for(&mut clock, Duration::from_secs(1));
    println!(
        "wave   -> {:?}, next ring at {}",
        clock.state().alarm,
        clock.state().fire_time
    );

    // Doze off again until it rings a second time.
    run_for(&mut clock, Duration::from_secs(300));
    println!("06:35 -> {:?}", clock.state().alarm);

    // Hit the alarm button to get up.
    buttons.press(1);
    run_for(&mut clock, Duration::from_millis(200));
    buttons.release(1);
    run_for(&mut clock, Duration::from_millis(200));

    let state = clock.state();
    assert_eq!(state.alarm, AlarmStatus::Idle);
    println!(
        "button -> {:?}, alarm {}, time {} on the clock, {} audio calls",
        state.alarm,
        if clock.settings().alarm_enabled { "armed" } else { "off" },
        numeric.content(),
        audio.calls().len()
    );

    clock.shutdown();
}
