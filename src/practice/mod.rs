pub mod cli;
pub mod engine;
pub mod formant;
pub mod history;
pub mod matching;
pub mod session;
pub mod timeline;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::audio::capture::CaptureConfig;
use crate::config::GenerationConfig;
use crate::profile::VocalProfile;
use crate::words::Level;

/// Convenient alias for results returned by practice modules.
pub type Result<T> = std::result::Result<T, PracticeError>;

pub const MIN_SPEED: u32 = 1;
pub const MAX_SPEED: u32 = 10;
pub const DEFAULT_SPEED: u32 = 2;

/// Pause between a filter change and the fetch it triggers.
pub const FETCH_DEBOUNCE: Duration = Duration::from_millis(1200);

/// Lightweight error type for the practice pipeline.
#[derive(Debug, Clone)]
pub struct PracticeError {
    message: Arc<str>,
}

impl PracticeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }
}

impl Display for PracticeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for PracticeError {}

/// One formant estimate per analysis frame, in Hz. Both fields zero is the
/// "no reliable peak" sentinel and suppresses matching.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormantSample {
    pub f1: f64,
    pub f2: f64,
}

impl FormantSample {
    pub fn new(f1: f64, f2: f64) -> Self {
        Self { f1, f2 }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn is_silent(&self) -> bool {
        self.f1 == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStatus {
    Hit,
    Miss,
}

impl Display for ScoreStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreStatus::Hit => f.write_str("hit"),
            ScoreStatus::Miss => f.write_str("miss"),
        }
    }
}

/// One entry in the bounded score log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub word: String,
    pub status: ScoreStatus,
    pub timestamp_ms: u64,
}

/// Session configuration shared across CLI, worker, and views.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub level: Level,
    pub profile: VocalProfile,
    pub speed: u32,
    pub capture: CaptureConfig,
    pub generation: GenerationConfig,
    pub words_file: Option<PathBuf>,
    pub fetch_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level: Level::default(),
            profile: VocalProfile::default(),
            speed: DEFAULT_SPEED,
            capture: CaptureConfig::default(),
            generation: GenerationConfig::default(),
            words_file: None,
            fetch_debounce: FETCH_DEBOUNCE,
        }
    }
}

/// Starts a practice session on its worker thread.
pub fn run_session(config: SessionConfig) -> Result<session::SessionRuntime> {
    session::SessionRuntime::start(config)
}
