use crate::timestamp::parse_timestamp;
use crate::{CaptionEntry, SubtitleError};

/// Parses a WebVTT document into caption entries.
///
/// Handles the variants platform caption endpoints actually serve: header
/// metadata lines (`WEBVTT`, `Kind:`, `Language:`), cue settings after the
/// timestamp line, inline styling tags (`<c>`, `<00:00:01.000>`), and
/// multi-line cue text.
pub fn parse_vtt(content: &str) -> Result<Vec<CaptionEntry>, SubtitleError> {
    let mut entries: Vec<CaptionEntry> = Vec::new();
    let mut current: Option<CaptionEntry> = None;

    for line in content.lines() {
        let line = line.trim();

        // Skip metadata and empty lines
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
        {
            if line.is_empty() {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
            }
            continue;
        }

        if line.contains("-->") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            // "start --> end" possibly followed by cue settings
            let mut halves = line.splitn(2, "-->");
            let start_raw = halves.next().unwrap_or_default();
            let end_raw = halves
                .next()
                .unwrap_or_default()
                .split_whitespace()
                .next()
                .unwrap_or_default();
            let (Ok(start), Ok(end)) = (parse_timestamp(start_raw), parse_timestamp(end_raw))
            else {
                // Unparsable cue timing, skip the cue body too
                current = None;
                continue;
            };
            current = Some(CaptionEntry::new(start, end, ""));
        } else if let Some(entry) = current.as_mut() {
            let clean = strip_tags(line);
            if clean.is_empty() {
                continue;
            }
            if entry.text.is_empty() {
                entry.text = clean;
            } else {
                entry.text.push(' ');
                entry.text.push_str(&clean);
            }
        }
        // Lines before any timestamp (cue identifiers) are ignored
    }

    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    Ok(entries)
}

/// Removes inline `<...>` styling and timing tags from cue text.
fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for ch in line.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}
