//! Segment normalization.
//!
//! Three heterogeneous raw caption shapes map onto [`TranscriptSegment`]:
//! timed-text XML, structured json3 events, and transcript-panel segment
//! records. Each parser returns `None` when zero segments survive filtering;
//! that is the signal the strategy chain uses to fall through to the next
//! method.

use crate::types::{Json3Root, PanelSegment, TranscriptSegment};

/// Decode HTML entities, collapse newlines to spaces, and trim.
///
/// Idempotent: running it over already-normalized text is a no-op.
pub fn clean_text(raw: &str) -> String {
    decode_entities(raw).replace('\n', " ").trim().to_string()
}

/// Decode the named and numeric HTML entities that show up in caption data.
/// Unrecognized entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    let re = regex!(r"&(#x?[0-9A-Fa-f]+|[A-Za-z]+);");
    re.replace_all(text, |caps: &regex::Captures| {
        let entity = &caps[1];
        match entity {
            "amp" => "&".to_string(),
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            "nbsp" => " ".to_string(),
            _ => decode_numeric_entity(entity).unwrap_or_else(|| caps[0].to_string()),
        }
    })
    .into_owned()
}

fn decode_numeric_entity(entity: &str) -> Option<String> {
    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(String::from)
}

/// Parse timed-text XML: `<text start="s" dur="s">body</text>` elements.
///
/// Elements whose body is empty after decoding are dropped.
pub fn parse_timed_text(xml: &str) -> Option<Vec<TranscriptSegment>> {
    let element = regex!(r#"(?s)<text\b([^>]*)>(.*?)</text>"#);
    let start_attr = regex!(r#"start="([^"]*)""#);
    let dur_attr = regex!(r#"dur="([^"]*)""#);

    let segments: Vec<TranscriptSegment> = element
        .captures_iter(xml)
        .filter_map(|caps| {
            let attrs = &caps[1];
            let start = start_attr
                .captures(attrs)
                .and_then(|c| c[1].parse::<f64>().ok())
                .unwrap_or(0.0);
            let duration = dur_attr
                .captures(attrs)
                .and_then(|c| c[1].parse::<f64>().ok())
                .unwrap_or(0.0);
            let text = clean_text(&caps[2]);
            (!text.is_empty()).then_some(TranscriptSegment {
                start,
                duration,
                text,
            })
        })
        .collect();

    (!segments.is_empty()).then_some(segments)
}

/// Parse json3 caption data: events carrying a `segs` array.
///
/// Events whose concatenated text is empty or a bare newline are dropped.
pub fn parse_json3(data: &Json3Root) -> Option<Vec<TranscriptSegment>> {
    let segments: Vec<TranscriptSegment> = data
        .events
        .iter()
        .filter_map(|event| {
            let segs = event.segs.as_ref()?;
            let joined: String = segs
                .iter()
                .filter_map(|s| s.utf8.as_deref())
                .collect();
            if joined == "\n" {
                return None;
            }
            let text = clean_text(&joined);
            (!text.is_empty()).then_some(TranscriptSegment {
                start: event.t_start_ms / 1000.0,
                duration: event.d_duration_ms / 1000.0,
                text,
            })
        })
        .collect();

    (!segments.is_empty()).then_some(segments)
}

/// Parse transcript-panel segment records.
///
/// Segments with empty trimmed text are dropped. A missing end time yields a
/// zero duration.
pub fn parse_panel_segments(records: &[PanelSegment]) -> Option<Vec<TranscriptSegment>> {
    let segments: Vec<TranscriptSegment> = records
        .iter()
        .filter_map(|record| {
            let start_ms = record.start_ms.parse::<f64>().unwrap_or(0.0);
            let end_ms = record.end_ms.parse::<f64>().unwrap_or(start_ms);
            let joined: String = record
                .snippet
                .as_ref()
                .map(|s| s.runs.iter().map(|r| r.text.as_str()).collect())
                .unwrap_or_default();
            let text = clean_text(&joined);
            (!text.is_empty()).then_some(TranscriptSegment {
                start: start_ms / 1000.0,
                duration: (end_ms - start_ms) / 1000.0,
                text,
            })
        })
        .collect();

    (!segments.is_empty()).then_some(segments)
}
