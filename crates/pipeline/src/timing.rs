//! Word timing source
//!
//! Builds the per-track timing table, either from exact provider word marks
//! or by distributing the measured audio duration over the words by a
//! length/syllable weight. Estimation never fails for non-empty input; empty
//! input is rejected upstream before synthesis.

use read_along_core::{TimingTable, WordTiming};

use crate::synthesis::WordMark;

/// Provider marks use 100 ns ticks
const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Tolerance when clamping marks against the measured track duration
const DURATION_EPSILON: f64 = 0.05;

/// Build a table from exact provider word marks
///
/// Offsets and durations are converted from 100 ns ticks to seconds and
/// clamped so the table never extends past the measured track duration by
/// more than a small epsilon.
pub fn from_word_marks(marks: &[WordMark], total_duration_secs: f64) -> TimingTable {
    let limit = total_duration_secs + DURATION_EPSILON;
    let timings = marks
        .iter()
        .map(|mark| {
            let start = (mark.offset_ticks as f64 / TICKS_PER_SECOND).min(limit);
            let duration = (mark.duration_ticks as f64 / TICKS_PER_SECOND).min(limit - start);
            WordTiming::new(mark.word.clone(), start, duration)
        })
        .collect();
    TimingTable::new(timings)
}

/// Estimate a table by distributing the track duration over the words
///
/// Each word gets weight `len + 0.5 * max(1, len / 3)` — its length plus a
/// syllable proxy — so longer, denser words hold the highlight proportionally
/// longer than a plain per-word split would. The durations sum to the total
/// track duration; offsets are the running sum.
pub fn estimate(text: &str, total_duration_secs: f64) -> TimingTable {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return TimingTable::default();
    }

    let weights: Vec<f64> = words.iter().map(|w| word_weight(w)).collect();
    let total_weight: f64 = weights.iter().sum();

    // unreachable given the syllable floor, but guard with an equal split
    if total_weight <= 0.0 {
        let per_word = total_duration_secs / words.len() as f64;
        let timings = words
            .iter()
            .enumerate()
            .map(|(i, w)| WordTiming::new(*w, i as f64 * per_word, per_word))
            .collect();
        return TimingTable::new(timings);
    }

    let mut cumulative = 0.0;
    let timings = words
        .iter()
        .zip(&weights)
        .map(|(word, weight)| {
            let duration = (weight / total_weight) * total_duration_secs;
            let timing = WordTiming::new(*word, cumulative, duration);
            cumulative += duration;
            timing
        })
        .collect();

    TimingTable::new(timings)
}

fn word_weight(word: &str) -> f64 {
    let len = word.len();
    let syllable_estimate = (len / 3).max(1);
    len as f64 + 0.5 * syllable_estimate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_weight_formula() {
        assert!((word_weight("the") - 3.5).abs() < EPS);
        assert!((word_weight("quick") - 5.5).abs() < EPS);
        assert!((word_weight("a") - 1.5).abs() < EPS);
        assert!((word_weight("extraordinary") - 15.0).abs() < EPS);
    }

    #[test]
    fn test_durations_sum_to_total() {
        let table = estimate("one two three four five six", 7.3);
        assert!((table.total_duration_secs() - 7.3).abs() < 1e-6);
    }

    #[test]
    fn test_offsets_monotonic_and_contiguous() {
        let table = estimate("pack my box with five dozen liquor jugs", 4.0);
        let timings = table.timings();
        for pair in timings.windows(2) {
            assert!(pair[1].start_secs >= pair[0].start_secs);
            assert!((pair[1].start_secs - pair[0].end_secs()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_quick_brown_fox_distribution() {
        // weights [3.5, 5.5, 5.5, 3.5], total weight 18.0
        let table = estimate("the quick brown fox", 2.0);
        assert_eq!(table.len(), 4);

        let timings = table.timings();
        assert!((timings[0].duration_secs - 3.5 / 18.0 * 2.0).abs() < 1e-9);
        assert!((timings[1].duration_secs - 5.5 / 18.0 * 2.0).abs() < 1e-9);

        // the two long words end exactly at the midpoint and at the total
        assert!((timings[1].end_secs() - 1.0).abs() < 1e-9);
        assert!((timings[3].end_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_word_spans_whole_track() {
        let table = estimate("hello", 3.25);
        assert_eq!(table.len(), 1);
        let t = &table.timings()[0];
        assert!((t.start_secs).abs() < EPS);
        assert!((t.duration_secs - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_yields_no_timings() {
        assert!(estimate("", 2.0).is_empty());
        assert!(estimate("   \t\n", 2.0).is_empty());
    }

    #[test]
    fn test_from_word_marks_converts_ticks() {
        let marks = vec![
            WordMark {
                word: "hello".to_string(),
                offset_ticks: 0,
                duration_ticks: 5_000_000,
            },
            WordMark {
                word: "world".to_string(),
                offset_ticks: 5_000_000,
                duration_ticks: 5_000_000,
            },
        ];
        let table = from_word_marks(&marks, 1.0);
        let timings = table.timings();
        assert!((timings[0].duration_secs - 0.5).abs() < EPS);
        assert!((timings[1].start_secs - 0.5).abs() < EPS);
        assert!((timings[1].end_secs() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_from_word_marks_clamps_overlong_marks() {
        let marks = vec![WordMark {
            word: "stretch".to_string(),
            offset_ticks: 5_000_000,
            duration_ticks: 50_000_000,
        }];
        let table = from_word_marks(&marks, 1.0);
        let t = &table.timings()[0];
        assert!(t.end_secs() <= 1.0 + 0.05 + EPS);
    }
}
