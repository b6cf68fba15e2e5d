//! Terminal highlight sink

use std::io::Write;

use read_along_pipeline::highlight::{progress_percent, HighlightSink};

/// Writes rendered highlight lines in place on stdout
pub struct TerminalSink {
    word_count: usize,
    clear_width: usize,
}

impl TerminalSink {
    pub fn new(word_count: usize, clear_width: usize) -> Self {
        Self {
            word_count,
            clear_width,
        }
    }
}

impl HighlightSink for TerminalSink {
    fn on_word(&self, index: usize, line: &str) {
        let progress = progress_percent(index, self.word_count);
        let mut stdout = std::io::stdout().lock();
        let _ = write!(
            stdout,
            "\r{:width$}\r[{progress:5.1}%] {line}",
            "",
            width = self.clear_width
        );
        let _ = stdout.flush();
    }
}
