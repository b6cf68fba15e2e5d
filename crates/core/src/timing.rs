//! Word timing types
//!
//! A timing table maps each word of the spoken text to the interval of the
//! audio track during which it is considered "being spoken". Tables are
//! produced once per track and immutable afterwards.

use serde::{Deserialize, Serialize};

/// Timing for a single word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    /// The word text
    pub word: String,

    /// Start offset in seconds from the beginning of the track
    pub start_secs: f64,

    /// Duration in seconds
    pub duration_secs: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start_secs: f64, duration_secs: f64) -> Self {
        Self {
            word: word.into(),
            start_secs,
            duration_secs,
        }
    }

    /// End offset in seconds
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Ordered word timing table, index-aligned with the tokenized text
///
/// Invariants: start offsets are non-decreasing and the last end offset does
/// not exceed the track duration by more than a small epsilon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingTable {
    timings: Vec<WordTiming>,
}

impl TimingTable {
    pub fn new(timings: Vec<WordTiming>) -> Self {
        Self { timings }
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn timings(&self) -> &[WordTiming] {
        &self.timings
    }

    pub fn get(&self, index: usize) -> Option<&WordTiming> {
        self.timings.get(index)
    }

    /// The words of the table, in order
    pub fn words(&self) -> Vec<String> {
        self.timings.iter().map(|t| t.word.clone()).collect()
    }

    /// Total spoken duration covered by the table
    pub fn total_duration_secs(&self) -> f64 {
        self.timings.iter().map(|t| t.duration_secs).sum()
    }

    /// Index of the word being spoken at `elapsed` seconds
    ///
    /// Returns the last index whose start offset is <= elapsed, clamped to
    /// `[0, len - 1]` even when elapsed exceeds the track duration.
    /// Returns None for an empty table.
    pub fn index_at(&self, elapsed_secs: f64) -> Option<usize> {
        if self.timings.is_empty() {
            return None;
        }

        let mut idx = 0;
        while idx + 1 < self.timings.len() && self.timings[idx + 1].start_secs <= elapsed_secs {
            idx += 1;
        }
        Some(idx)
    }
}

impl From<Vec<WordTiming>> for TimingTable {
    fn from(timings: Vec<WordTiming>) -> Self {
        Self::new(timings)
    }
}
