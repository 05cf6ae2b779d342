//! Looping word timeline. Words occupy fixed-width slots scrolling past a
//! marker; the slot under the marker supplies the active matching target.
//! Slots that leave a short grace zone behind the marker unmatched are
//! reported missed, exactly once each. Global slot indices grow without
//! bound and wrap onto the word list by mathematical modulo.

use std::collections::HashSet;

pub const SLOT_WIDTH: f64 = 300.0;
pub const MARKER_POSITION: f64 = 150.0;
pub const MISS_GRACE: f64 = 80.0;
pub const STRIP_REPEATS: usize = 3;

/// One rendered slot of the looping strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotView {
    pub slot: i64,
    pub word_index: usize,
    pub cleared: bool,
}

/// Playback state machine for one word-list lifetime.
#[derive(Debug, Clone)]
pub struct Timeline {
    word_count: usize,
    offset: f64,
    cleared: HashSet<i64>,
    missed: HashSet<i64>,
    next_sweep: i64,
}

impl Timeline {
    pub fn new(word_count: usize) -> Self {
        Self {
            word_count,
            offset: 0.0,
            cleared: HashSet::new(),
            missed: HashSet::new(),
            next_sweep: 0,
        }
    }

    /// Replaces the word list: offset and both tracking sets start over.
    pub fn reset(&mut self, word_count: usize) {
        *self = Self::new(word_count);
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Global index of the slot currently under the marker.
    pub fn current_slot(&self) -> i64 {
        ((self.offset + MARKER_POSITION) / SLOT_WIDTH).floor() as i64
    }

    /// Last slot that has fully exited the grace zone behind the marker.
    fn grace_slot(&self) -> i64 {
        ((self.offset + MARKER_POSITION - MISS_GRACE) / SLOT_WIDTH).floor() as i64
    }

    /// Word index shown in a global slot, by mathematical modulo.
    pub fn word_at(&self, slot: i64) -> Option<usize> {
        if self.word_count == 0 {
            return None;
        }
        Some(slot.rem_euclid(self.word_count as i64) as usize)
    }

    /// Word to match right now; `None` when the list is empty or the
    /// current slot is already cleared.
    pub fn active_word(&self) -> Option<usize> {
        let slot = self.current_slot();
        if self.cleared.contains(&slot) {
            return None;
        }
        self.word_at(slot)
    }

    pub fn is_cleared(&self, slot: i64) -> bool {
        self.cleared.contains(&slot)
    }

    pub fn is_missed(&self, slot: i64) -> bool {
        self.missed.contains(&slot)
    }

    /// Advances playback and returns the word indices newly missed. Every
    /// slot is evaluated exactly once, whatever the advance distance.
    pub fn advance(&mut self, distance: f64) -> Vec<usize> {
        self.offset += distance;
        self.sweep_misses()
    }

    fn sweep_misses(&mut self) -> Vec<usize> {
        let mut missed_words = Vec::new();
        if self.word_count == 0 {
            return missed_words;
        }
        let current = self.current_slot();
        let grace = self.grace_slot();
        while self.next_sweep <= grace && self.next_sweep < current {
            let slot = self.next_sweep;
            self.next_sweep += 1;
            if self.cleared.contains(&slot) {
                continue;
            }
            if !self.missed.insert(slot) {
                continue;
            }
            if let Some(word) = self.word_at(slot) {
                missed_words.push(word);
            }
        }
        missed_words
    }

    /// Marks the slot under the marker as matched. Returns whether the
    /// clear is new; repeats are no-ops.
    pub fn clear_current(&mut self) -> bool {
        if self.word_count == 0 {
            return false;
        }
        self.cleared.insert(self.current_slot())
    }

    /// Width of one full repetition. Non-zero even for an empty list so
    /// offset arithmetic stays finite.
    pub fn loop_width(&self) -> f64 {
        self.word_count.max(1) as f64 * SLOT_WIDTH
    }

    /// Offset folded into one repetition, for seamless strip rendering.
    pub fn visible_offset(&self) -> f64 {
        self.offset % self.loop_width()
    }

    /// The renderable strip: three consecutive repetitions of the list with
    /// per-slot cleared flags.
    pub fn strip(&self) -> Vec<SlotView> {
        (0..STRIP_REPEATS * self.word_count)
            .map(|index| {
                let slot = index as i64;
                SlotView {
                    slot,
                    word_index: index % self.word_count,
                    cleared: self.cleared.contains(&slot),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Timeline;

    #[test]
    fn word_wrapping_is_non_negative() {
        let timeline = Timeline::new(3);
        assert_eq!(timeline.word_at(-1), Some(2));
        assert_eq!(timeline.word_at(7), Some(1));
    }

    #[test]
    fn empty_list_is_inert_but_finite() {
        let mut timeline = Timeline::new(0);
        assert!(timeline.advance(1000.0).is_empty());
        assert_eq!(timeline.active_word(), None);
        assert!(!timeline.clear_current());
        assert!(timeline.loop_width() > 0.0);
        assert!(timeline.visible_offset().is_finite());
    }
}
