//! Highlight rendering
//!
//! Stateless, side-effect-free: maps a word list and the current index to a
//! display-ready line. The controller invokes it once per index change and
//! hands the result to whatever sink is attached; the sink itself (terminal,
//! web push, GUI) stays outside the pipeline.

use read_along_config::HighlightConfig;

const DIM: &str = "\x1b[90m";
const CURRENT: &str = "\x1b[97;44m";
const RESET: &str = "\x1b[0m";

/// A display sink receiving rendered highlight lines
pub trait HighlightSink: Send + Sync {
    /// Called once per highlight-index change
    fn on_word(&self, index: usize, line: &str);
}

/// Render the highlight window containing `current_index`
///
/// The word sequence is partitioned into fixed windows of
/// `words_per_line`; within the window, already-spoken words are dimmed,
/// the current word is emphasized, upcoming words are plain. The result is
/// truncated to `max_line_chars` with a trailing ellipsis.
pub fn render_line(words: &[String], current_index: usize, config: &HighlightConfig) -> String {
    if words.is_empty() {
        return String::new();
    }

    let window = config.words_per_line.max(1);
    let current = current_index.min(words.len() - 1);
    let start = (current / window) * window;
    let end = (start + window).min(words.len());

    let mut parts = Vec::with_capacity(end - start);
    for (i, word) in words.iter().enumerate().take(end).skip(start) {
        if i == current {
            parts.push(format!("{CURRENT} {word} {RESET}"));
        } else if i < current {
            parts.push(format!("{DIM}{word}{RESET}"));
        } else {
            parts.push(word.clone());
        }
    }

    truncate_line(parts.join(" "), config.max_line_chars)
}

/// Progress through the word sequence, in percent
pub fn progress_percent(current_index: usize, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    (current_index.min(word_count - 1) as f64 / word_count as f64) * 100.0
}

fn truncate_line(line: String, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line;
    }
    let keep = max_chars.saturating_sub(3);
    let truncated: String = line.chars().take(keep).collect();
    // close any escape sequence the cut may have left open
    format!("{truncated}{RESET}...")
}
