//! Alarm audio.
//!
//! Audio is optional. Without the `audio` feature, or when it is turned off
//! in the config, the clock uses [`SilentAudio`].

use crate::config::ClockConfig;

use log::debug;

/// Plays alarm tracks. Calls return immediately.
pub trait AlarmAudio {
    /// Set the mixer volume (0-100).
    fn set_volume(&mut self, level: u8);

    /// Start playing track `track` (1-based).
    fn play_track(&mut self, track: u8);
}

/// File name of a track: `01.mp3` for track 1.
pub fn track_file(track: u8) -> String {
    format!("{track:02}.mp3")
}

/// Audio backend that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AlarmAudio for SilentAudio {
    fn set_volume(&mut self, level: u8) {
        debug!("audio disabled: volume {level}");
    }

    fn play_track(&mut self, track: u8) {
        debug!("audio disabled: play {}", track_file(track));
    }
}

#[cfg(feature = "audio")]
pub use command::CommandAudio;

#[cfg(feature = "audio")]
mod command {
    use super::{AlarmAudio, track_file};
    use crate::error::ClockError;

    use log::{debug, error};
    use std::path::PathBuf;
    use std::process::{Command, Stdio};

    /// Plays tracks with `mpg123` and sets volume with `amixer`.
    ///
    /// Each call spawns the tool and returns without waiting for it.
    #[derive(Debug, Clone)]
    pub struct CommandAudio {
        track_dir: PathBuf,
        mixer_control: String,
    }

    impl CommandAudio {
        /// Play tracks from `track_dir` and control the `PCM` mixer.
        pub fn new(track_dir: impl Into<PathBuf>) -> Self {
            Self {
                track_dir: track_dir.into(),
                mixer_control: "PCM".to_string(),
            }
        }

        fn spawn(program: &str, args: &[&str]) -> Result<(), ClockError> {
            Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map(drop)
                .map_err(|e| ClockError::Audio(format!("{program}: {e}")))
        }
    }

    impl AlarmAudio for CommandAudio {
        fn set_volume(&mut self, level: u8) {
            let level = format!("{}%", level.min(100));
            debug!("volume {level}");
            if let Err(e) = Self::spawn("amixer", &["-q", "sset", &self.mixer_control, &level]) {
                error!("{e}");
            }
        }

        fn play_track(&mut self, track: u8) {
            let path = self.track_dir.join(track_file(track));
            let path = path.to_string_lossy();
            debug!("playing {path}");
            if let Err(e) = Self::spawn("mpg123", &["-q", &path]) {
                error!("{e}");
            }
        }
    }
}

#[cfg(feature = "audio")]
fn command_backend(config: &ClockConfig) -> Option<Box<dyn AlarmAudio>> {
    Some(Box::new(CommandAudio::new(config.track_dir.clone())))
}

#[cfg(not(feature = "audio"))]
fn command_backend(_config: &ClockConfig) -> Option<Box<dyn AlarmAudio>> {
    log::warn!("audio requested but this build has no audio support");
    None
}

/// Pick the backend the config asks for.
pub fn from_config(config: &ClockConfig) -> Box<dyn AlarmAudio> {
    if config.audio
        && let Some(backend) = command_backend(config)
    {
        return backend;
    }
    Box::new(SilentAudio)
}
