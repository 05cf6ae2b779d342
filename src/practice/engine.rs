//! Per-tick practice pipeline. One tick: ingest the newest formant sample,
//! advance the timeline and collect misses, resolve the active target,
//! compute the match verdict, then clear and log. The miss sweep only sees
//! slots strictly behind the marker and clearing only touches the slot
//! under it, so a slot can never score both ways in one tick.

use std::sync::Arc;

use crate::practice::history::ScoreHistory;
use crate::practice::timeline::Timeline;
use crate::practice::{matching, FormantSample, MAX_SPEED, MIN_SPEED};
use crate::profile::VocalProfile;
use crate::words::{PracticeWord, VowelTarget};

/// What one tick produced, for logging and snapshot assembly.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub hit: bool,
    pub active_word: Option<usize>,
    pub cleared_word: Option<usize>,
    pub missed_words: Vec<usize>,
}

/// Owns all mutable practice state; driven by the session worker, pure
/// with respect to time and audio (both arrive as arguments).
pub struct PracticeEngine {
    words: Arc<[PracticeWord]>,
    timeline: Timeline,
    history: ScoreHistory,
    profile: VocalProfile,
    speed: u32,
    running: bool,
    mic_enabled: bool,
    sample: FormantSample,
}

impl PracticeEngine {
    pub fn new(profile: VocalProfile, speed: u32) -> Self {
        Self {
            words: Arc::from(Vec::new()),
            timeline: Timeline::new(0),
            history: ScoreHistory::new(),
            profile,
            speed: clamp_speed(speed),
            running: true,
            mic_enabled: false,
            sample: FormantSample::silent(),
        }
    }

    pub fn words(&self) -> Arc<[PracticeWord]> {
        Arc::clone(&self.words)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    pub fn profile(&self) -> VocalProfile {
        self.profile
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mic_enabled(&self) -> bool {
        self.mic_enabled
    }

    pub fn sample(&self) -> FormantSample {
        self.sample
    }

    /// Installs a fresh word list and starts a new timeline lifetime.
    pub fn set_words(&mut self, words: Vec<PracticeWord>) {
        self.timeline.reset(words.len());
        self.words = Arc::from(words);
    }

    pub fn set_profile(&mut self, profile: VocalProfile) {
        self.profile = profile;
    }

    pub fn set_speed(&mut self, speed: u32) {
        self.speed = clamp_speed(speed);
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn set_mic_enabled(&mut self, enabled: bool) {
        self.mic_enabled = enabled;
    }

    /// Vowel to match right now: first vowel of the uncleared word under
    /// the marker.
    pub fn active_target(&self) -> Option<&VowelTarget> {
        self.timeline
            .active_word()
            .and_then(|index| self.words.get(index))
            .and_then(|word| word.primary_vowel())
    }

    /// Runs one tick. `sample` is the latest formant estimate if analysis
    /// produced one; otherwise the previous sample carries over.
    pub fn tick(&mut self, sample: Option<FormantSample>, now_ms: u64) -> TickReport {
        if let Some(sample) = sample {
            self.sample = sample;
        }
        let mut report = TickReport::default();
        if self.running {
            for word_index in self.timeline.advance(self.speed as f64) {
                if let Some(word) = self.words.get(word_index) {
                    self.history.record_miss(&word.text, now_ms);
                }
                report.missed_words.push(word_index);
            }
        }
        report.active_word = self.timeline.active_word();
        let scale = self.profile.scale_factor();
        report.hit = matching::is_hit(
            self.sample,
            self.active_target(),
            scale,
            self.mic_enabled,
            self.running,
        );
        if report.hit && self.timeline.clear_current() {
            report.cleared_word = report.active_word;
            if let Some(word) = report.active_word.and_then(|index| self.words.get(index)) {
                self.history.record_hit(&word.text, now_ms);
            }
        }
        report
    }
}

fn clamp_speed(speed: u32) -> u32 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}
