//! Session runtime: a named worker thread owns the practice engine and the
//! capture chain, driven on a fixed tick. Controls arrive as commands over
//! a channel; state leaves as immutable snapshots. Word fetches run on
//! short-lived helper threads and are tagged with a generation so a stale
//! slow response can never overwrite a newer list.

use std::collections::{BTreeSet, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::audio::analyzer::SpectrumAnalyzer;
use crate::audio::capture::{CaptureConfig, LiveCapture};
use crate::audio::{resample, ANALYSIS_SAMPLE_RATE};
use crate::practice::engine::PracticeEngine;
use crate::practice::history::epoch_ms;
use crate::practice::timeline::SlotView;
use crate::practice::{
    formant, FormantSample, PracticeError, Result, ScoreEntry, SessionConfig, DEFAULT_SPEED,
};
use crate::profile::{AgeGroup, Gender, VocalProfile};
use crate::words::generate::{
    load_words, BuiltinWords, FileWords, GenerationClient, WordRequest, WordSource,
};
use crate::words::{Level, PracticeWord};

const TICK: Duration = Duration::from_millis(16);

/// Cloneable command sender for a running session.
#[derive(Clone)]
pub struct SessionController {
    tx: Sender<SessionCommand>,
}

/// Owning handle for the worker thread; dropping it shuts the session down
/// and joins the worker.
pub struct SessionRuntime {
    config: SessionConfig,
    controller: SessionController,
    updates: Receiver<SessionSnapshot>,
    join: Option<JoinHandle<()>>,
}

/// Read-only view of the session published once per tick.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub sample: FormantSample,
    pub hit: bool,
    pub active: Option<ActiveTarget>,
    pub offset: f64,
    pub visible_offset: f64,
    pub running: bool,
    pub mic_enabled: bool,
    pub loading: bool,
    pub speed: u32,
    pub level: Level,
    pub profile: VocalProfile,
    pub words: Arc<[PracticeWord]>,
    pub strip: Vec<SlotView>,
    pub history: Vec<ScoreEntry>,
    pub hits: usize,
    pub misses: usize,
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            sample: FormantSample::silent(),
            hit: false,
            active: None,
            offset: 0.0,
            visible_offset: 0.0,
            running: true,
            mic_enabled: false,
            loading: true,
            speed: DEFAULT_SPEED,
            level: Level::default(),
            profile: VocalProfile::default(),
            words: Arc::from(Vec::new()),
            strip: Vec::new(),
            history: Vec::new(),
            hits: 0,
            misses: 0,
            error: None,
        }
    }
}

/// Word currently under the marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveTarget {
    pub word_index: usize,
    pub word: String,
    pub ipa: String,
}

#[derive(Clone, Debug)]
enum SessionCommand {
    Resume,
    Pause,
    SetSpeed(u32),
    SetLevel(Level),
    SetGender(Gender),
    SetAge(AgeGroup),
    TogglePhoneme(String),
    ClearPhonemes,
    Regenerate,
    EnableMic,
    Shutdown,
}

impl SessionController {
    pub fn resume(&self) -> Result<()> {
        self.send(SessionCommand::Resume, "resume playback")
    }

    pub fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause, "pause playback")
    }

    pub fn set_speed(&self, speed: u32) -> Result<()> {
        self.send(SessionCommand::SetSpeed(speed), "set speed")
    }

    pub fn set_level(&self, level: Level) -> Result<()> {
        self.send(SessionCommand::SetLevel(level), "set level")
    }

    pub fn set_gender(&self, gender: Gender) -> Result<()> {
        self.send(SessionCommand::SetGender(gender), "set gender")
    }

    pub fn set_age(&self, age: AgeGroup) -> Result<()> {
        self.send(SessionCommand::SetAge(age), "set age group")
    }

    pub fn toggle_phoneme(&self, ipa: impl Into<String>) -> Result<()> {
        self.send(
            SessionCommand::TogglePhoneme(ipa.into()),
            "toggle phoneme filter",
        )
    }

    pub fn clear_phonemes(&self) -> Result<()> {
        self.send(SessionCommand::ClearPhonemes, "clear phoneme filters")
    }

    pub fn regenerate(&self) -> Result<()> {
        self.send(SessionCommand::Regenerate, "regenerate words")
    }

    pub fn enable_mic(&self) -> Result<()> {
        self.send(SessionCommand::EnableMic, "enable microphone")
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown, "shutdown session")
    }

    fn send(&self, command: SessionCommand, label: &str) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| PracticeError::new(format!("failed to {}", label)))
    }
}

impl SessionRuntime {
    /// Spawns the session worker with live microphone capture. The capture
    /// stream itself is not opened until the mic is enabled.
    pub fn start(config: SessionConfig) -> Result<Self> {
        let capture_config = config.capture.clone();
        Self::start_with(config, move || LiveCaptureSource::new(capture_config))
    }

    /// Spawns the session worker with an injected capture source; the
    /// factory runs on the worker thread because live audio handles do not
    /// travel between threads.
    pub fn start_with<C, F>(config: SessionConfig, make_capture: F) -> Result<Self>
    where
        C: CaptureSource + 'static,
        F: FnOnce() -> C + Send + 'static,
    {
        let source = build_word_source(&config)?;
        info!(
            level = %config.level,
            speed = config.speed,
            offline = config.generation.is_offline(),
            "launching session worker"
        );
        let worker_config = config.clone();
        let (command_tx, command_rx) = channel();
        let (update_tx, update_rx) = channel();
        let join = thread::Builder::new()
            .name("practice-session".to_string())
            .spawn(move || {
                let worker = SessionWorker::new(worker_config, make_capture(), source);
                worker.run(command_rx, update_tx);
            })
            .map_err(|err| {
                error!(error = %err, "failed to spawn session worker thread");
                PracticeError::new(err.to_string())
            })?;
        Ok(Self {
            config,
            controller: SessionController { tx: command_tx },
            updates: update_rx,
            join: Some(join),
        })
    }

    pub fn controller(&self) -> SessionController {
        self.controller.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn try_recv(&self) -> Option<SessionSnapshot> {
        self.updates.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SessionSnapshot> {
        self.updates.recv_timeout(timeout).ok()
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        let _ = self.controller.shutdown();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Source of capture audio chunks. `try_chunk` must never block: the
/// worker drains pending chunks on each tick and moves on.
pub trait CaptureSource {
    fn start(&mut self) -> Result<u32>;
    fn try_chunk(&mut self) -> Option<Vec<f32>>;
    fn stop(&mut self);
}

/// Microphone-backed capture source; the stream opens on `start`.
pub struct LiveCaptureSource {
    config: CaptureConfig,
    live: Option<LiveCapture>,
}

impl LiveCaptureSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config, live: None }
    }
}

impl CaptureSource for LiveCaptureSource {
    fn start(&mut self) -> Result<u32> {
        info!(
            device = ?self.config.device_name,
            latency_ms = ?self.config.latency_ms,
            "starting live capture stream"
        );
        let live = LiveCapture::start(&self.config).map_err(|err| {
            let message = format!("{err:#}");
            error!(
                device = ?self.config.device_name,
                error = %message,
                "failed to start live capture stream"
            );
            PracticeError::new(message)
        })?;
        let sample_rate = live.sample_rate();
        self.live = Some(live);
        Ok(sample_rate)
    }

    fn try_chunk(&mut self) -> Option<Vec<f32>> {
        self.live.as_ref().and_then(|capture| capture.try_chunk())
    }

    fn stop(&mut self) {
        if let Some(capture) = self.live.take() {
            capture.stop();
        }
    }
}

/// In-memory capture source for tests.
pub struct MockCapture {
    sample_rate: u32,
    chunks: VecDeque<Vec<f32>>,
    started: bool,
}

impl MockCapture {
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>, chunk_len: usize) -> Self {
        let mut chunks = VecDeque::new();
        if chunk_len == 0 {
            chunks.push_back(samples);
        } else {
            for chunk in samples.chunks(chunk_len) {
                chunks.push_back(chunk.to_vec());
            }
        }
        Self {
            sample_rate,
            chunks,
            started: false,
        }
    }
}

impl CaptureSource for MockCapture {
    fn start(&mut self) -> Result<u32> {
        self.started = true;
        Ok(self.sample_rate)
    }

    fn try_chunk(&mut self) -> Option<Vec<f32>> {
        if !self.started {
            return None;
        }
        self.chunks.pop_front()
    }

    fn stop(&mut self) {
        self.started = false;
    }
}

struct FetchOutcome {
    generation: u64,
    words: Vec<PracticeWord>,
}

/// Dispatches word fetches on helper threads and tracks the latest issued
/// generation; results from older generations are discarded on receipt.
struct WordFetcher {
    source: Arc<dyn WordSource>,
    results_tx: Sender<FetchOutcome>,
    latest: u64,
}

impl WordFetcher {
    fn new(source: Arc<dyn WordSource>, results_tx: Sender<FetchOutcome>) -> Self {
        Self {
            source,
            results_tx,
            latest: 0,
        }
    }

    fn dispatch(&mut self, request: WordRequest) -> u64 {
        self.latest += 1;
        let generation = self.latest;
        let source = Arc::clone(&self.source);
        let results_tx = self.results_tx.clone();
        let spawned = thread::Builder::new()
            .name("word-fetch".to_string())
            .spawn(move || {
                let words = load_words(source.as_ref(), &request);
                let _ = results_tx.send(FetchOutcome { generation, words });
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn word fetch thread, using fallback list");
            let _ = self.results_tx.send(FetchOutcome {
                generation,
                words: crate::words::fallback_words(),
            });
        }
        generation
    }

    fn is_latest(&self, generation: u64) -> bool {
        generation == self.latest
    }
}

struct SessionWorker<C: CaptureSource> {
    engine: PracticeEngine,
    capture: C,
    analyzer: Option<SpectrumAnalyzer>,
    capture_rate: Option<u32>,
    fetcher: WordFetcher,
    results_rx: Receiver<FetchOutcome>,
    fetch_due: Option<Instant>,
    debounce: Duration,
    level: Level,
    phonemes: BTreeSet<String>,
    loading: bool,
    hit: bool,
    error: Option<String>,
    dirty: bool,
}

impl<C: CaptureSource> SessionWorker<C> {
    fn new(config: SessionConfig, capture: C, source: Arc<dyn WordSource>) -> Self {
        let (results_tx, results_rx) = channel();
        Self {
            engine: PracticeEngine::new(config.profile, config.speed),
            capture,
            analyzer: None,
            capture_rate: None,
            fetcher: WordFetcher::new(source, results_tx),
            results_rx,
            fetch_due: None,
            debounce: config.fetch_debounce,
            level: config.level,
            phonemes: BTreeSet::new(),
            loading: true,
            hit: false,
            error: None,
            dirty: false,
        }
    }

    fn run(mut self, commands: Receiver<SessionCommand>, updates: Sender<SessionSnapshot>) {
        info!("session worker running");
        self.schedule_fetch();
        let _ = updates.send(self.snapshot());
        loop {
            let tick_started = Instant::now();
            if self.drain_commands(&commands) {
                break;
            }
            self.dispatch_due_fetch();
            self.apply_fetch_results();
            let sample = self.capture_step();
            if sample.is_some() || self.engine.is_running() {
                self.dirty = true;
            }
            let report = self.engine.tick(sample, epoch_ms());
            if self.hit != report.hit {
                self.hit = report.hit;
                self.dirty = true;
            }
            self.log_events(&report);
            if self.dirty {
                let _ = updates.send(self.snapshot());
                self.dirty = false;
            }
            let elapsed = tick_started.elapsed();
            if elapsed < TICK {
                thread::sleep(TICK - elapsed);
            }
        }
        self.capture.stop();
        info!("session worker exiting");
    }

    /// Returns true when the worker should shut down.
    fn drain_commands(&mut self, commands: &Receiver<SessionCommand>) -> bool {
        while let Some(command) = poll_command(commands) {
            if matches!(command, SessionCommand::Shutdown) {
                info!("shutdown command received");
                return true;
            }
            self.handle_command(command);
            self.dirty = true;
        }
        false
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Resume => {
                info!("playback resumed");
                self.engine.set_running(true);
            }
            SessionCommand::Pause => {
                info!("playback paused");
                self.engine.set_running(false);
            }
            SessionCommand::SetSpeed(speed) => {
                self.engine.set_speed(speed);
                debug!(speed = self.engine.speed(), "speed updated");
            }
            SessionCommand::SetLevel(level) => {
                if self.level != level {
                    info!(level = %level, "practice level changed");
                    self.level = level;
                    self.schedule_fetch();
                }
            }
            SessionCommand::SetGender(gender) => {
                let mut profile = self.engine.profile();
                profile.gender = gender;
                self.engine.set_profile(profile);
                debug!(scale = profile.scale_factor(), "vocal profile updated");
            }
            SessionCommand::SetAge(age) => {
                let mut profile = self.engine.profile();
                profile.age = age;
                self.engine.set_profile(profile);
                debug!(scale = profile.scale_factor(), "vocal profile updated");
            }
            SessionCommand::TogglePhoneme(ipa) => {
                if !self.phonemes.remove(&ipa) {
                    self.phonemes.insert(ipa);
                }
                self.schedule_fetch();
            }
            SessionCommand::ClearPhonemes => {
                self.phonemes.clear();
                self.schedule_fetch();
            }
            SessionCommand::Regenerate => {
                info!("regeneration requested");
                self.dispatch_fetch();
            }
            SessionCommand::EnableMic => self.enable_mic(),
            SessionCommand::Shutdown => unreachable!("handled by drain_commands"),
        }
    }

    fn enable_mic(&mut self) {
        if self.engine.mic_enabled() {
            debug!("microphone already enabled");
            return;
        }
        match self.capture.start() {
            Ok(sample_rate) => {
                self.capture_rate = Some(sample_rate);
                self.analyzer = Some(SpectrumAnalyzer::new(ANALYSIS_SAMPLE_RATE));
                self.engine.set_mic_enabled(true);
                self.error = None;
                info!(sample_rate, "microphone enabled");
            }
            Err(err) => {
                // Stays disabled; the user retries the activation action.
                error!(error = %err, "microphone activation failed");
                self.error = Some(err.to_string());
            }
        }
    }

    fn schedule_fetch(&mut self) {
        self.fetch_due = Some(Instant::now() + self.debounce);
    }

    fn dispatch_due_fetch(&mut self) {
        if let Some(due) = self.fetch_due {
            if Instant::now() >= due {
                self.dispatch_fetch();
            }
        }
    }

    fn dispatch_fetch(&mut self) {
        self.fetch_due = None;
        self.loading = true;
        self.dirty = true;
        let phonemes: Vec<String> = self.phonemes.iter().cloned().collect();
        let generation = self
            .fetcher
            .dispatch(WordRequest::new(self.level, phonemes));
        debug!(generation, level = %self.level, "word fetch dispatched");
    }

    fn apply_fetch_results(&mut self) {
        while let Ok(outcome) = self.results_rx.try_recv() {
            if !self.fetcher.is_latest(outcome.generation) {
                debug!(
                    generation = outcome.generation,
                    latest = self.fetcher.latest,
                    "discarding stale word fetch"
                );
                continue;
            }
            info!(
                count = outcome.words.len(),
                generation = outcome.generation,
                "word list applied"
            );
            self.engine.set_words(outcome.words);
            self.loading = false;
            self.dirty = true;
        }
    }

    fn capture_step(&mut self) -> Option<FormantSample> {
        if !self.engine.mic_enabled() {
            return None;
        }
        let capture_rate = self.capture_rate?;
        while let Some(chunk) = self.capture.try_chunk() {
            match resample::linear_resample(&chunk, capture_rate, ANALYSIS_SAMPLE_RATE) {
                Ok(resampled) => {
                    if let Some(analyzer) = self.analyzer.as_mut() {
                        analyzer.push(&resampled);
                    }
                }
                Err(err) => warn!(error = %err, "dropping capture chunk"),
            }
        }
        let frame = self.analyzer.as_mut()?.frame()?;
        let scale = self.engine.profile().scale_factor();
        Some(formant::estimate_formants(&frame, scale))
    }

    fn log_events(&self, report: &crate::practice::engine::TickReport) {
        for &index in &report.missed_words {
            if let Some(word) = self.engine.words().get(index).cloned() {
                info!(word = %word.text, "word missed");
            }
        }
        if let Some(index) = report.cleared_word {
            if let Some(word) = self.engine.words().get(index).cloned() {
                let sample = self.engine.sample();
                info!(word = %word.text, f1 = sample.f1, f2 = sample.f2, "word hit");
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let timeline = self.engine.timeline();
        let active = timeline.active_word().and_then(|index| {
            let word = self.engine.words().get(index).cloned()?;
            let ipa = word
                .primary_vowel()
                .map(|vowel| vowel.ipa.clone())
                .unwrap_or_default();
            Some(ActiveTarget {
                word_index: index,
                word: word.text,
                ipa,
            })
        });
        let history = self.engine.history();
        SessionSnapshot {
            sample: self.engine.sample(),
            hit: self.hit,
            active,
            offset: timeline.offset(),
            visible_offset: timeline.visible_offset(),
            running: self.engine.is_running(),
            mic_enabled: self.engine.mic_enabled(),
            loading: self.loading,
            speed: self.engine.speed(),
            level: self.level,
            profile: self.engine.profile(),
            words: self.engine.words(),
            strip: timeline.strip(),
            history: history.entries().to_vec(),
            hits: history.hits(),
            misses: history.misses(),
            error: self.error.clone(),
        }
    }
}

fn build_word_source(config: &SessionConfig) -> Result<Arc<dyn WordSource>> {
    if let Some(path) = &config.words_file {
        info!(path = %path.display(), "serving words from file");
        return Ok(Arc::new(FileWords::new(path.clone())));
    }
    if let Some(endpoint) = &config.generation.endpoint {
        let client = GenerationClient::new(endpoint.clone())
            .map_err(|err| PracticeError::new(format!("{err:#}")))?;
        info!(endpoint = %endpoint, "serving words from generation endpoint");
        return Ok(Arc::new(client));
    }
    info!("no endpoint configured, serving bundled words");
    Ok(Arc::new(BuiltinWords))
}

fn poll_command(commands: &Receiver<SessionCommand>) -> Option<SessionCommand> {
    match commands.try_recv() {
        Ok(command) => Some(command),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(SessionCommand::Shutdown),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use std::sync::Arc;
    use std::time::Duration;

    use super::{MockCapture, WordFetcher};
    use crate::practice::session::CaptureSource;
    use crate::words::generate::{WordRequest, WordSource};
    use crate::words::{Level, PracticeWord};

    struct CannedWords(Vec<PracticeWord>);

    impl WordSource for CannedWords {
        fn fetch(&self, _request: &WordRequest) -> anyhow::Result<Vec<PracticeWord>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn only_the_latest_generation_is_accepted() {
        let (tx, rx) = channel();
        let source = Arc::new(CannedWords(crate::words::fallback_words()));
        let mut fetcher = WordFetcher::new(source, tx);
        let first = fetcher.dispatch(WordRequest::new(Level::A1, Vec::new()));
        let second = fetcher.dispatch(WordRequest::new(Level::B2, Vec::new()));
        assert!(!fetcher.is_latest(first));
        assert!(fetcher.is_latest(second));

        let mut received = Vec::new();
        for _ in 0..2 {
            let outcome = rx
                .recv_timeout(Duration::from_secs(2))
                .expect("fetch thread should deliver a result");
            received.push(outcome.generation);
        }
        received.sort_unstable();
        assert_eq!(received, vec![first, second]);
    }

    #[test]
    fn mock_capture_replays_chunks_once_started() {
        let mut capture = MockCapture::from_samples(16_000, vec![0.0; 10], 4);
        assert!(capture.try_chunk().is_none());
        assert_eq!(capture.start().unwrap(), 16_000);
        assert_eq!(capture.try_chunk().map(|c| c.len()), Some(4));
        assert_eq!(capture.try_chunk().map(|c| c.len()), Some(4));
        assert_eq!(capture.try_chunk().map(|c| c.len()), Some(2));
        assert!(capture.try_chunk().is_none());
        capture.stop();
    }
}
