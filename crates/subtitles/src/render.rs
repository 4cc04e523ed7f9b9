use crate::timestamp::{format_srt_time, format_vtt_time};
use crate::CaptionEntry;

/// Renders entries as plain text, one entry per line.
pub fn render_text(entries: &[CaptionEntry]) -> String {
    entries
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders entries as an SRT document.
///
/// Cues are numbered from 1 in input order; timestamps use the comma
/// millisecond separator.
pub fn render_srt(entries: &[CaptionEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_time(entry.start_secs),
            format_srt_time(entry.end_secs),
            entry.text
        ));
    }
    out
}

/// Renders entries as a WebVTT document.
pub fn render_vtt(entries: &[CaptionEntry]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for entry in entries {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_time(entry.start_secs),
            format_vtt_time(entry.end_secs),
            entry.text
        ));
    }
    out
}
