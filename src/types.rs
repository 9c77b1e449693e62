//! Canonical transcript types and serde models of the host site's schemas.
//!
//! The upstream schemas (player response, json3 caption data, transcript
//! panel) are assumed, not owned, by this crate and may change without
//! notice; every field is optional or defaulted accordingly.

use serde::{Deserialize, Serialize};

/// One timed line of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start offset in seconds.
    pub start: f64,
    /// Duration in seconds. Zero when the source did not carry one.
    pub duration: f64,
    /// Trimmed, entity-decoded text with newlines collapsed to spaces.
    pub text: String,
}

/// The normalized result of one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResult {
    /// Video title as resolved from the page.
    pub title: String,
    /// Segments in source order. No dedup or sort is performed.
    pub transcript: Vec<TranscriptSegment>,
    /// Language code of the fetched track.
    pub language: String,
    /// Display name of the fetched track.
    pub track_name: String,
}

/// One caption track offered by the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    /// Language code, e.g. "en" or "en-GB".
    #[serde(default)]
    pub language_code: String,
    /// Track kind. `"asr"` marks an automatic track; absent means manual.
    #[serde(default)]
    pub kind: Option<String>,
    /// URL the caption data is served from.
    #[serde(default)]
    pub base_url: String,
}

impl CaptionTrack {
    /// Whether this is an automatically generated track.
    pub fn is_auto(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Embedded player response, reduced to the caption track list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub captions: Option<Captions>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    #[serde(default)]
    pub player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracklistRenderer {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

impl PlayerResponse {
    /// The caption track list, if the player carries one.
    pub fn caption_tracks(&self) -> Option<&[CaptionTrack]> {
        let tracks = self
            .captions
            .as_ref()?
            .player_captions_tracklist_renderer
            .as_ref()?
            .caption_tracks
            .as_slice();
        (!tracks.is_empty()).then_some(tracks)
    }
}

/// Caption data in the structured "json3" form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Json3Root {
    #[serde(default)]
    pub events: Vec<Json3Event>,
}

/// One json3 caption event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Json3Event {
    /// Start time in milliseconds.
    #[serde(default)]
    pub t_start_ms: f64,
    /// Duration in milliseconds.
    #[serde(default)]
    pub d_duration_ms: f64,
    /// Text runs. Events without `segs` are styling/window events.
    #[serde(default)]
    pub segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Json3Seg {
    #[serde(default)]
    pub utf8: Option<String>,
}

/// One segment record from the transcript panel endpoint.
///
/// Times come over the wire as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSegment {
    #[serde(default)]
    pub start_ms: String,
    #[serde(default)]
    pub end_ms: String,
    #[serde(default)]
    pub snippet: Option<PanelSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelSnippet {
    #[serde(default)]
    pub runs: Vec<PanelRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelRun {
    #[serde(default)]
    pub text: String,
}
