//! Transcript export.
//!
//! Every export is a pure function of the segment list, an
//! include-timestamps flag, and an optional start/end time filter, producing
//! byte-exact text.

use crate::types::TranscriptSegment;
use serde::Serialize;

/// End-time fallback for subtitle formats when a segment carries no
/// duration.
const DEFAULT_DURATION: f64 = 2.0;

/// Options shared by all exports.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Prefix lines with formatted start timestamps where the format
    /// supports it.
    pub include_timestamps: bool,
    /// Keep only segments starting at or after this offset (seconds).
    pub start: Option<f64>,
    /// Keep only segments starting at or before this offset (seconds).
    pub end: Option<f64>,
}

/// Apply the time-range filter.
pub fn filter_segments<'a>(
    segments: &'a [TranscriptSegment],
    options: &ExportOptions,
) -> Vec<&'a TranscriptSegment> {
    let start = options.start.unwrap_or(0.0);
    let end = options.end.unwrap_or(f64::INFINITY);
    segments
        .iter()
        .filter(|s| s.start >= start && s.start <= end)
        .collect()
}

/// Plain text: one line per segment, `[M:SS]` prefixes when requested.
pub fn to_text(segments: &[TranscriptSegment], options: &ExportOptions) -> String {
    filter_segments(segments, options)
        .iter()
        .map(|s| {
            if options.include_timestamps {
                format!("[{}] {}", format_timestamp(s.start), s.text)
            } else {
                s.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    title: &'a str,
    segment_count: usize,
    transcript: Vec<JsonSegment<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSegment<'a> {
    start: f64,
    duration: f64,
    start_formatted: String,
    text: &'a str,
}

/// Structured JSON document, pretty-printed.
pub fn to_json(title: &str, segments: &[TranscriptSegment], options: &ExportOptions) -> String {
    let filtered = filter_segments(segments, options);
    let export = JsonExport {
        title,
        segment_count: filtered.len(),
        transcript: filtered
            .iter()
            .map(|s| JsonSegment {
                start: s.start,
                duration: s.duration,
                start_formatted: format_timestamp(s.start),
                text: &s.text,
            })
            .collect(),
    };
    // Serialization of plain data cannot fail.
    serde_json::to_string_pretty(&export).unwrap_or_default()
}

/// SubRip subtitles.
pub fn to_srt(segments: &[TranscriptSegment], options: &ExportOptions) -> String {
    filter_segments(segments, options)
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                srt_timestamp(s.start),
                srt_timestamp(s.start + effective_duration(s)),
                s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// WebVTT subtitles.
pub fn to_vtt(segments: &[TranscriptSegment], options: &ExportOptions) -> String {
    let body = filter_segments(segments, options)
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                vtt_timestamp(s.start),
                vtt_timestamp(s.start + effective_duration(s)),
                s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("WEBVTT\n\n{body}")
}

/// Lightweight markup document.
pub fn to_markdown(title: &str, segments: &[TranscriptSegment], options: &ExportOptions) -> String {
    let filtered = filter_segments(segments, options);
    let mut md = format!(
        "# {title}\n\n**Segments:** {}\n\n---\n\n## Transcript\n\n",
        filtered.len()
    );
    for s in &filtered {
        if options.include_timestamps {
            md.push_str(&format!("**[{}]** {}\n\n", format_timestamp(s.start), s.text));
        } else {
            md.push_str(&format!("{}\n\n", s.text));
        }
    }
    md
}

/// Tabular text with a fixed header row; embedded quotes are doubled.
pub fn to_csv(segments: &[TranscriptSegment], options: &ExportOptions) -> String {
    let header = "Index,Start (seconds),Start (formatted),Duration,Text\n";
    let rows = filter_segments(segments, options)
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{},{:.2},{},{:.2},\"{}\"",
                i + 1,
                s.start,
                format_timestamp(s.start),
                s.duration,
                s.text.replace('"', "\"\"")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header}{rows}")
}

fn effective_duration(segment: &TranscriptSegment) -> f64 {
    if segment.duration > 0.0 {
        segment.duration
    } else {
        DEFAULT_DURATION
    }
}

/// Human-readable offset: `M:SS`, or `H:MM:SS` past the hour mark.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds as u64;
    let hrs = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hrs > 0 {
        format!("{hrs}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Parse `SS`, `M:SS`, or `H:MM:SS` into seconds. Anything else is 0.
pub fn parse_timestamp(input: &str) -> f64 {
    let input = input.trim();
    if input.is_empty() {
        return 0.0;
    }
    let parts: Vec<f64> = input
        .split(':')
        .map(|p| p.parse::<f64>().unwrap_or(0.0))
        .collect();
    match parts.as_slice() {
        [s] => *s,
        [m, s] => m * 60.0 + s,
        [h, m, s] => h * 3600.0 + m * 60.0 + s,
        _ => 0.0,
    }
}

fn srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

fn vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

fn split_timestamp(seconds: f64) -> (u64, u64, u64, u64) {
    let total = seconds as u64;
    let ms = ((seconds - total as f64) * 1000.0) as u64;
    (total / 3600, (total % 3600) / 60, total % 60, ms)
}
