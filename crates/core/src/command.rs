//! Playback commands and modes
//!
//! Commands are transient value objects parsed from control-surface tokens.
//! Every surface (terminal, web, GUI) maps its input onto the same vocabulary.

use serde::{Deserialize, Serialize};

/// Presentation mode for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Audio with transport controls only
    Plain,
    /// Audio with word-level highlight events
    Karaoke,
}

impl PlaybackMode {
    pub fn toggled(self) -> Self {
        match self {
            PlaybackMode::Plain => PlaybackMode::Karaoke,
            PlaybackMode::Karaoke => PlaybackMode::Plain,
        }
    }
}

/// A playback control command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Resume,
    Stop,
    Replay,
    /// Seek relative to the current position, in seconds (negative = rewind)
    SeekRelative(f64),
    SwitchMode(PlaybackMode),
    Quit,
}

impl Command {
    /// Parse a control-surface token into a command
    ///
    /// Accepts the single-letter tokens of the interactive control menu
    /// (`p`, `r`, `s`, `y`, `w`, `f`, `h`, `q`) as well as full names,
    /// case-insensitively. `seek_step_secs` sets the magnitude of the
    /// rewind/forward commands. Unrecognized input yields None; callers
    /// re-prompt rather than fail.
    ///
    /// The mode-switch token carries no target mode: the caller applies
    /// `PlaybackMode::toggled` to its current mode.
    pub fn parse(token: &str, seek_step_secs: f64, current_mode: PlaybackMode) -> Option<Command> {
        match token.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Command::Pause),
            "r" | "resume" => Some(Command::Resume),
            "s" | "stop" => Some(Command::Stop),
            "y" | "replay" => Some(Command::Replay),
            "w" | "rewind" | "seekback" => Some(Command::SeekRelative(-seek_step_secs)),
            "f" | "forward" | "seekforward" => Some(Command::SeekRelative(seek_step_secs)),
            "h" | "mode" | "switchmode" => Some(Command::SwitchMode(current_mode.toggled())),
            "q" | "quit" => Some(Command::Quit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letter_tokens() {
        let mode = PlaybackMode::Plain;
        assert_eq!(Command::parse("p", 5.0, mode), Some(Command::Pause));
        assert_eq!(Command::parse("R", 5.0, mode), Some(Command::Resume));
        assert_eq!(Command::parse("s", 5.0, mode), Some(Command::Stop));
        assert_eq!(Command::parse("y", 5.0, mode), Some(Command::Replay));
        assert_eq!(Command::parse("q", 5.0, mode), Some(Command::Quit));
    }

    #[test]
    fn test_seek_tokens_carry_step() {
        let mode = PlaybackMode::Karaoke;
        assert_eq!(
            Command::parse("w", 5.0, mode),
            Some(Command::SeekRelative(-5.0))
        );
        assert_eq!(
            Command::parse("forward", 3.0, mode),
            Some(Command::SeekRelative(3.0))
        );
    }

    #[test]
    fn test_mode_switch_toggles() {
        assert_eq!(
            Command::parse("h", 5.0, PlaybackMode::Plain),
            Some(Command::SwitchMode(PlaybackMode::Karaoke))
        );
        assert_eq!(
            Command::parse("h", 5.0, PlaybackMode::Karaoke),
            Some(Command::SwitchMode(PlaybackMode::Plain))
        );
    }

    #[test]
    fn test_unrecognized_is_none() {
        assert_eq!(Command::parse("x", 5.0, PlaybackMode::Plain), None);
        assert_eq!(Command::parse("", 5.0, PlaybackMode::Plain), None);
        assert_eq!(Command::parse("  ", 5.0, PlaybackMode::Plain), None);
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(
            Command::parse(" pause \n", 5.0, PlaybackMode::Plain),
            Some(Command::Pause)
        );
    }
}
