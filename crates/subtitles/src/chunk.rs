use crate::CaptionEntry;

/// Synthesizes fixed-duration caption entries from plain text.
///
/// Used when a speech-to-text backend returns raw text without segment
/// timing: the text is split into chunks of `words_per_entry` words and each
/// chunk is assigned a consecutive `entry_duration_secs` slot. The resulting
/// timestamps are an approximation with no relation to actual speech timing.
pub fn chunk_text(text: &str, words_per_entry: usize, entry_duration_secs: f64) -> Vec<CaptionEntry> {
    let words_per_entry = words_per_entry.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    words
        .chunks(words_per_entry)
        .enumerate()
        .map(|(i, chunk)| {
            let start = i as f64 * entry_duration_secs;
            CaptionEntry::new(start, start + entry_duration_secs, chunk.join(" "))
        })
        .collect()
}
