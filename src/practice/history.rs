//! Bounded score log, most recent first. Repeated hit reports for the same
//! word inside a short window collapse into one entry; misses always land.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::practice::{ScoreEntry, ScoreStatus};

pub const HISTORY_LIMIT: usize = 50;
const HIT_DEDUPE_MS: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct ScoreHistory {
    entries: Vec<ScoreEntry>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a hit unless the newest entry is a hit for the same word from
    /// under a second ago. Returns whether an entry was added.
    pub fn record_hit(&mut self, word: &str, timestamp_ms: u64) -> bool {
        if self.is_recent_hit(word, timestamp_ms) {
            return false;
        }
        self.push(ScoreEntry {
            word: word.to_string(),
            status: ScoreStatus::Hit,
            timestamp_ms,
        });
        true
    }

    pub fn record_miss(&mut self, word: &str, timestamp_ms: u64) {
        self.push(ScoreEntry {
            word: word.to_string(),
            status: ScoreStatus::Miss,
            timestamp_ms,
        });
    }

    /// Newest first.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.count(ScoreStatus::Hit)
    }

    pub fn misses(&self) -> usize {
        self.count(ScoreStatus::Miss)
    }

    fn count(&self, status: ScoreStatus) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    fn is_recent_hit(&self, word: &str, now_ms: u64) -> bool {
        self.entries.first().map_or(false, |last| {
            last.status == ScoreStatus::Hit
                && last.word == word
                && now_ms.saturating_sub(last.timestamp_ms) < HIT_DEDUPE_MS
        })
    }

    fn push(&mut self, entry: ScoreEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
    }
}

/// Milliseconds since the Unix epoch, the timestamp base for score entries.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
