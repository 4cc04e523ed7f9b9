use crate::SubtitleError;

/// Parses a subtitle timestamp to seconds.
///
/// Accepts `HH:MM:SS.mmm`, `HH:MM:SS,mmm`, `MM:SS.mmm`, and bare seconds
/// (`"12.5"`), which covers SRT, WebVTT, and the float offsets some caption
/// sources hand back.
pub fn parse_timestamp(raw: &str) -> Result<f64, SubtitleError> {
    let s = raw.trim().replace(',', ".");
    let parts: Vec<&str> = s.split(':').collect();

    let secs = match parts.len() {
        // HH:MM:SS.mmm
        3 => {
            let hours: f64 = parse_part(parts[0], raw)?;
            let minutes: f64 = parse_part(parts[1], raw)?;
            let seconds: f64 = parse_part(parts[2], raw)?;
            hours * 3600.0 + minutes * 60.0 + seconds
        }
        // MM:SS.mmm
        2 => {
            let minutes: f64 = parse_part(parts[0], raw)?;
            let seconds: f64 = parse_part(parts[1], raw)?;
            minutes * 60.0 + seconds
        }
        // Bare seconds
        1 => parse_part(parts[0], raw)?,
        _ => return Err(SubtitleError::InvalidTimestamp(raw.to_string())),
    };

    if !secs.is_finite() || secs < 0.0 {
        return Err(SubtitleError::InvalidTimestamp(raw.to_string()));
    }
    Ok(secs)
}

fn parse_part(part: &str, raw: &str) -> Result<f64, SubtitleError> {
    part.trim()
        .parse()
        .map_err(|_| SubtitleError::InvalidTimestamp(raw.to_string()))
}

/// Formats seconds as an SRT timestamp, `HH:MM:SS,mmm`.
pub fn format_srt_time(secs: f64) -> String {
    format_time(secs, ',')
}

/// Formats seconds as a WebVTT timestamp, `HH:MM:SS.mmm`.
pub fn format_vtt_time(secs: f64) -> String {
    format_time(secs, '.')
}

fn format_time(secs: f64, sep: char) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    // Round at millisecond precision, carrying into seconds when the
    // fraction rounds up to 1000. The `as` cast saturates, so open-ended
    // "until the end of time" cues format without overflow.
    let total_ms = (secs * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}{sep}{millis:03}")
}
