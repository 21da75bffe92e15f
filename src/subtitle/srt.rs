use anyhow::{anyhow, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use crate::subtitle::format::strip_bom;

// @module: Sequential caption (SRT) parsing

// @const: SRT timing line, tolerant of '.' separators and short fractions
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})",
    )
    .unwrap()
});

// @struct: Single caption entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number as found in the file (renumbered on output)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Caption text, lines separated by '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new caption entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }
}

/// Fraction digits are read as a decimal fraction: "5" is 500 ms, "05" is 50 ms.
fn parse_fraction_ms(digits: &str) -> Result<u64> {
    if digits.is_empty() || digits.len() > 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("Invalid fraction: {}", digits));
    }
    let value: u64 = digits.parse()?;
    Ok(value * 10u64.pow(3 - digits.len() as u32))
}

fn capture_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64> {
    let field = |offset: usize| -> Result<u64> {
        caps.get(start_idx + offset)
            .map(|m| m.as_str().parse::<u64>())
            .transpose()?
            .ok_or_else(|| anyhow!("Missing timestamp component"))
    };

    let hours = field(0)?;
    let minutes = field(1)?;
    let seconds = field(2)?;
    let millis = caps
        .get(start_idx + 3)
        .map(|m| parse_fraction_ms(m.as_str()))
        .transpose()?
        .unwrap_or(0);

    hours
        .checked_mul(60)
        .and_then(|v| v.checked_add(minutes))
        .and_then(|v| v.checked_mul(60))
        .and_then(|v| v.checked_add(seconds))
        .and_then(|v| v.checked_mul(1000))
        .and_then(|v| v.checked_add(millis))
        .ok_or_else(|| anyhow!("Timestamp out of range"))
}

fn is_sequence_number(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Parse sequential caption content.
///
/// Entries keep their file order. Entries with empty text are kept; dropping
/// them is the normalizer's job. Fails when not a single timing line is found.
pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let content = strip_bom(content);

    let mut entries = Vec::new();
    // Timing and sequence number of the entry being collected
    let mut current: Option<(usize, u64, u64)> = None;
    let mut pending_lines: Vec<&str> = Vec::new();
    let mut pending_seq: Option<usize> = None;

    for (line_idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');

        if let Some(caps) = TIMESTAMP_REGEX.captures(line) {
            let (start_ms, end_ms) = match (capture_ms(&caps, 1), capture_ms(&caps, 5)) {
                (Ok(start), Ok(end)) => (start, end),
                _ => {
                    warn!("Invalid timestamp at line {}: {}", line_idx + 1, line.trim());
                    if current.is_some() {
                        pending_lines.push(line);
                    }
                    continue;
                }
            };

            // The sequence number of this entry ends up as the last line of the previous one
            let seq_num = take_trailing_sequence_number(&mut pending_lines).or(pending_seq.take());

            if let Some((prev_seq, prev_start, prev_end)) = current.take() {
                entries.push(SubtitleEntry::new(prev_seq, prev_start, prev_end, join_text(&pending_lines)));
            }
            pending_lines.clear();

            let seq_num = seq_num.unwrap_or(entries.len() + 1);
            current = Some((seq_num, start_ms, end_ms));
            continue;
        }

        if current.is_some() {
            pending_lines.push(line);
        } else if is_sequence_number(line) {
            pending_seq = line.trim().parse().ok();
        } else if !line.trim().is_empty() {
            debug!("Ignoring text before first timing line at line {}", line_idx + 1);
        }
    }

    if let Some((seq_num, start_ms, end_ms)) = current.take() {
        entries.push(SubtitleEntry::new(seq_num, start_ms, end_ms, join_text(&pending_lines)));
    }

    if entries.is_empty() {
        return Err(SubtitleError::Parse(
            "no caption timing lines were found".to_string(),
        ));
    }

    Ok(entries)
}

/// Pop a trailing sequence number that starts the next block
fn take_trailing_sequence_number(lines: &mut Vec<&str>) -> Option<usize> {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let last_idx = lines.len().checked_sub(1)?;
    let starts_block = last_idx == 0 || lines[last_idx - 1].trim().is_empty();
    if starts_block && is_sequence_number(lines[last_idx]) {
        let seq = lines[last_idx].trim().parse().ok();
        lines.pop();
        seq
    } else {
        None
    }
}

fn join_text(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());

    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
