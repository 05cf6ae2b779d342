use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Result};
use clap::{Args, Parser, Subcommand};

use crate::audio::capture::CaptureConfig;
use crate::config::GenerationConfig;
use crate::practice::{SessionConfig, DEFAULT_SPEED, FETCH_DEBOUNCE, MAX_SPEED, MIN_SPEED};
use crate::profile::{AgeGroup, Gender, VocalProfile};
use crate::words::Level;

#[derive(Parser, Debug)]
#[command(
    name = "phonodrill",
    about = "Real-time vowel pronunciation trainer (formant tracking against target ellipses)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a headless practice session and print a score summary.
    Session(SessionArgs),
    /// Print the bundled vowel inventory for a vocal profile.
    Vowels(VowelsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Optional input device name.
    #[arg(long)]
    pub device: Option<String>,
    /// Minimum latency in milliseconds for capture buffering.
    #[arg(long = "latency-min")]
    pub latency_min: Option<u32>,
    /// Maximum latency in milliseconds for capture buffering.
    #[arg(long = "latency-max")]
    pub latency_max: Option<u32>,
}

impl CaptureArgs {
    pub fn latency_range(&self) -> Result<RangeInclusive<u32>> {
        match (self.latency_min, self.latency_max) {
            (Some(min), Some(max)) => {
                ensure!(min > 0, "latency_min must be positive");
                ensure!(max >= min, "latency_max must be >= latency_min");
                Ok(min..=max)
            }
            (None, None) => Ok(CaptureConfig::default().latency_ms),
            _ => anyhow::bail!("provide both latency-min and latency-max or neither"),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Speaker gender, used to rescale formant targets.
    #[arg(long, value_enum, default_value_t = Gender::Male)]
    pub gender: Gender,
    /// Speaker age group, used to rescale formant targets.
    #[arg(long, value_enum, default_value_t = AgeGroup::Adult)]
    pub age: AgeGroup,
}

impl ProfileArgs {
    pub fn profile(&self) -> VocalProfile {
        VocalProfile::new(self.gender, self.age)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct SessionArgs {
    /// CEFR proficiency level for generated words.
    #[arg(long, value_enum, default_value_t = Level::A1)]
    pub level: Level,
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// Playback speed, distance advanced per tick.
    #[arg(long, default_value_t = DEFAULT_SPEED,
          value_parser = clap::value_parser!(u32).range(MIN_SPEED as i64..=MAX_SPEED as i64))]
    pub speed: u32,
    #[command(flatten)]
    pub capture: CaptureArgs,
    /// Word-generation relay endpoint; falls back to PHONODRILL_ENDPOINT.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Local JSON word list standing in for the generation service.
    #[arg(long = "words-file")]
    pub words_file: Option<PathBuf>,
    /// Restrict generated words to these IPA phonemes.
    #[arg(long = "phoneme")]
    pub phonemes: Vec<String>,
    /// Seconds to run before printing the summary.
    #[arg(long, default_value_t = 30)]
    pub duration: u64,
    /// Activate microphone capture at startup.
    #[arg(long = "enable-mic", default_value_t = false)]
    pub enable_mic: bool,
}

impl SessionArgs {
    pub fn session_config(&self) -> Result<SessionConfig> {
        let capture = CaptureConfig {
            device_name: self.capture.device.clone(),
            latency_ms: self.capture.latency_range()?,
        };
        Ok(SessionConfig {
            level: self.level,
            profile: self.profile.profile(),
            speed: self.speed,
            capture,
            generation: GenerationConfig::from_override(self.endpoint.clone()),
            words_file: self.words_file.clone(),
            fetch_debounce: FETCH_DEBOUNCE,
        })
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct VowelsArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// Include diphthongs in the listing.
    #[arg(long, default_value_t = false)]
    pub diphthongs: bool,
}
