/*!
 * Subtitle format sniffing.
 *
 * A cheap content heuristic, not a grammar check: style-sheet files are
 * recognized by their three section markers, sequential captions by a
 * leading sequence number.
 */

use std::fmt;
use std::path::Path;

use crate::errors::SubtitleError;

/// Section header of the script metadata block
pub const SCRIPT_INFO_MARKER: &str = "[Script Info]";
/// Section header of the style table
pub const STYLES_MARKER: &str = "[V4+ Styles]";
/// Section header of the event table
pub const EVENTS_MARKER: &str = "[Events]";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Detected subtitle format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Sections, named styles and events (`.ass`)
    StyleSheet,
    /// Numbered, time-ordered captions (`.srt`)
    SequentialCaption,
    /// Neither heuristic matched
    Unknown,
}

impl SubtitleFormat {
    /// Classify subtitle content.
    pub fn detect(content: &str) -> Self {
        let content = strip_bom(content);

        if content.contains(SCRIPT_INFO_MARKER)
            && content.contains(STYLES_MARKER)
            && content.contains(EVENTS_MARKER)
        {
            return Self::StyleSheet;
        }

        let starts_with_digit = content.chars().next().is_some_and(|c| c.is_ascii_digit());
        if starts_with_digit && content.contains('\n') {
            return Self::SequentialCaption;
        }

        Self::Unknown
    }

    /// Classify a subtitle file on disk.
    pub fn detect_file<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::detect(&content))
    }

    /// Format to parse as. Unknown content is treated as plain captions,
    /// which is the common case needing conversion.
    pub fn effective(self) -> Self {
        match self {
            Self::Unknown => Self::SequentialCaption,
            other => other,
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::StyleSheet => "ass",
            Self::SequentialCaption | Self::Unknown => "srt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StyleSheet => write!(f, "style-sheet (ASS)"),
            Self::SequentialCaption => write!(f, "sequential captions (SRT)"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Remove any leading byte-order marks
pub fn strip_bom(content: &str) -> &str {
    content.trim_start_matches(BYTE_ORDER_MARK)
}
