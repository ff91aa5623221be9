//! Bedside alarm clock.
//!
//! Run with: `cargo run -- --settings settings.json`
//!
//! Without display drivers the frames are logged; set `RUST_LOG=debug` to
//! follow the alarm engine as well.

use aclock::{
    AlarmClock, BandSchedule, ClockConfig, Devices, JsonFileStore, LogDisplay, NoInput,
    SystemClock, audio,
};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const MAX_SNOOZE_MINUTES: i64 = 12 * 60;

#[derive(Parser)]
#[command(name = "aclock")]
#[command(about = "Bedside LED alarm clock", long_about = None)]
struct Args {
    /// Settings file, created on first save
    #[arg(long, default_value = aclock::settings::SETTINGS_FILE)]
    settings: PathBuf,
    /// Milliseconds between ticks while not ringing
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Minutes a wave gesture snoozes the alarm
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=MAX_SNOOZE_MINUTES))]
    snooze_minutes: u32,
    /// Use compressed afternoon bands to try the display modes at a desk
    #[arg(long)]
    debug_bands: bool,
    /// Play alarm tracks (needs the `audio` feature)
    #[arg(long)]
    audio: bool,
    /// Directory holding 01.mp3 .. 06.mp3
    #[arg(long, default_value = ".")]
    track_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> ClockConfig {
        let mut config = ClockConfig {
            settings_path: self.settings,
            tick_interval: Duration::from_millis(self.tick_ms),
            audio: self.audio,
            track_dir: self.track_dir,
            ..Default::default()
        }
        .with_snooze_minutes(self.snooze_minutes);
        if self.debug_bands {
            config.bands = BandSchedule::debug();
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    let store = JsonFileStore::new(config.settings_path.clone());
    info!("settings file: {}", store.path().display());

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))?;

    let devices = Devices {
        alpha: Box::new(LogDisplay::new("alpha")),
        numeric: Box::new(LogDisplay::new("numeric")),
        buttons: Box::new(NoInput),
        encoder: Box::new(NoInput),
        gesture: Box::new(NoInput),
        clock: Box::new(SystemClock::new()),
        store: Box::new(store),
        audio: audio::from_config(&config),
    };

    AlarmClock::new(config, devices).run(&stop);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_build_config() {
        let args = Args::try_parse_from(["aclock", "--tick-ms", "20", "--debug-bands"]).unwrap();
        let config = args.into_config();
        assert_eq!(config.tick_interval, Duration::from_millis(20));
        assert_eq!(config.bands, BandSchedule::debug());
        assert_eq!(config.alarm.snooze, chrono::TimeDelta::minutes(5));
    }

    #[test]
    fn test_snooze_minutes_out_of_range_rejected() {
        assert!(Args::try_parse_from(["aclock", "--snooze-minutes", "0"]).is_err());
        assert!(Args::try_parse_from(["aclock", "--snooze-minutes", "721"]).is_err());
        assert!(
            Args::try_parse_from(["aclock", "--snooze-minutes", "99999999999999999"]).is_err()
        );

        let args = Args::try_parse_from(["aclock", "--snooze-minutes", "720"]).unwrap();
        assert_eq!(args.into_config().alarm.snooze, chrono::TimeDelta::minutes(720));
    }
}
