use std::collections::HashSet;

use crate::timestamp::parse_timestamp;
use crate::{CaptionEntry, SubtitleError};

/// Parses an SRT document, deduplicates by (start time, text), and sorts by
/// start time.
///
/// Cues with an unparsable index or timestamp line are skipped rather than
/// failing the whole document; caption providers emit enough junk that a
/// single bad cue should not lose the transcript.
pub fn parse_srt(content: &str) -> Result<Vec<CaptionEntry>, SubtitleError> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        // Skip blank lines between cues
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        // Index line
        let index_line = match lines.next() {
            Some(l) => l.trim().to_string(),
            None => break,
        };
        if index_line.parse::<usize>().is_err() {
            continue;
        }

        // Timestamp line: "HH:MM:SS,mmm --> HH:MM:SS,mmm"
        let ts_line = match lines.next() {
            Some(l) => l.trim().to_string(),
            None => break,
        };
        let (start_secs, end_secs) = match parse_timestamp_line(&ts_line) {
            Some(t) => t,
            None => continue,
        };

        // Text lines until blank line or EOF
        let mut text_parts = Vec::new();
        while let Some(line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text_parts.push(lines.next().unwrap().trim().to_string());
        }

        entries.push(CaptionEntry::new(start_secs, end_secs, text_parts.join(" ")));
    }

    // Deduplicate by (start time rounded to ms, text)
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();
    for entry in entries {
        let key = ((entry.start_secs * 1000.0).round() as i64, entry.text.clone());
        if seen.insert(key) {
            deduped.push(entry);
        }
    }

    deduped.sort_by(|a, b| a.start_secs.partial_cmp(&b.start_secs).unwrap());

    Ok(deduped)
}

/// Parses a timestamp line like `00:00:02,965 --> 00:00:04,277`.
fn parse_timestamp_line(line: &str) -> Option<(f64, f64)> {
    let parts: Vec<&str> = line.split("-->").collect();
    if parts.len() != 2 {
        return None;
    }
    let start = parse_timestamp(parts[0]).ok()?;
    let end = parse_timestamp(parts[1]).ok()?;
    Some((start, end))
}
