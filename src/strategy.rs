//! Extraction strategy chain.
//!
//! Three independent methods for obtaining raw caption data, tried strictly
//! in order until one yields at least one segment. A failure inside one
//! method never escapes it: network and parse errors are converted to "no
//! result" and the chain proceeds. The chain itself fails only by
//! exhaustion.

use crate::error::Result;
use crate::innertube::DEFAULT_CLIENT_VERSION;
use crate::normalize;
use crate::page::PageGlobals;
use crate::track::select_track;
use crate::types::{Json3Root, PanelSegment, PlayerResponse, TranscriptSegment};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// The network surfaces a strategy may hit. Implemented over HTTP by
/// [`crate::innertube::InnertubeClient`]; tests substitute canned data.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch a track's caption data in the structured json3 form.
    async fn caption_json3(&self, base_url: &str) -> Result<Json3Root>;
    /// Fetch a track's caption data in the timed-text XML form.
    async fn caption_xml(&self, base_url: &str) -> Result<String>;
    /// Request player data for a video from the internal player endpoint.
    async fn player(
        &self,
        api_key: &str,
        client_version: &str,
        video_id: &str,
    ) -> Result<PlayerResponse>;
    /// Request the transcript panel segment list for a video.
    async fn transcript_panel(
        &self,
        api_key: &str,
        client_version: &str,
        video_id: &str,
    ) -> Result<Vec<PanelSegment>>;
}

/// Ordered chain over the three extraction methods.
#[derive(Clone)]
pub struct ExtractionChain {
    source: Arc<dyn CaptionSource>,
    language: String,
}

impl ExtractionChain {
    pub fn new(source: Arc<dyn CaptionSource>, language: String) -> Self {
        Self { source, language }
    }

    /// Run the chain. Returns the first method's non-empty segment list, or
    /// `None` when all three are exhausted.
    pub async fn run(
        &self,
        globals: &PageGlobals,
        video_id: &str,
    ) -> Option<Vec<TranscriptSegment>> {
        if let Some(segments) = self.from_player_response(globals).await {
            debug!(segments = segments.len(), "player response method succeeded");
            return Some(segments);
        }
        debug!("player response method yielded nothing");

        if let Some(segments) = self.from_innertube_player(globals, video_id).await {
            debug!(segments = segments.len(), "innertube player method succeeded");
            return Some(segments);
        }
        debug!("innertube player method yielded nothing");

        if let Some(segments) = self.from_panel(globals, video_id).await {
            debug!(segments = segments.len(), "panel method succeeded");
            return Some(segments);
        }
        debug!("panel method yielded nothing; chain exhausted");
        None
    }

    /// Method 1: caption tracks from the embedded player response. The track
    /// data is fetched in json3 form first, then in XML form.
    async fn from_player_response(&self, globals: &PageGlobals) -> Option<Vec<TranscriptSegment>> {
        let tracks = globals.player_response.as_ref()?.caption_tracks()?;
        let track = select_track(tracks, &self.language)?;
        debug!(
            language = %track.language_code,
            auto = track.is_auto(),
            "selected embedded track"
        );

        match self.source.caption_json3(&track.base_url).await {
            Ok(data) => {
                if let Some(segments) = normalize::parse_json3(&data) {
                    return Some(segments);
                }
            }
            Err(e) => debug!("json3 fetch failed: {}", e),
        }

        match self.source.caption_xml(&track.base_url).await {
            Ok(xml) => normalize::parse_timed_text(&xml),
            Err(e) => {
                debug!("XML fetch failed: {}", e);
                None
            }
        }
    }

    /// Method 2: track list from the internal player endpoint. A missing API
    /// key yields no result, not an error.
    async fn from_innertube_player(
        &self,
        globals: &PageGlobals,
        video_id: &str,
    ) -> Option<Vec<TranscriptSegment>> {
        let api_key = globals.api_key.as_deref()?;
        let client_version = globals
            .client_version
            .as_deref()
            .unwrap_or(DEFAULT_CLIENT_VERSION);

        let player = match self.source.player(api_key, client_version, video_id).await {
            Ok(player) => player,
            Err(e) => {
                debug!("player endpoint failed: {}", e);
                return None;
            }
        };
        let track = select_track(player.caption_tracks()?, &self.language)?;

        match self.source.caption_json3(&track.base_url).await {
            Ok(data) => normalize::parse_json3(&data),
            Err(e) => {
                debug!("json3 fetch failed: {}", e);
                None
            }
        }
    }

    /// Method 3: segment list from the transcript panel endpoint.
    async fn from_panel(
        &self,
        globals: &PageGlobals,
        video_id: &str,
    ) -> Option<Vec<TranscriptSegment>> {
        let api_key = globals.api_key.as_deref()?;
        let client_version = globals
            .client_version
            .as_deref()
            .unwrap_or(DEFAULT_CLIENT_VERSION);

        match self
            .source
            .transcript_panel(api_key, client_version, video_id)
            .await
        {
            Ok(records) => normalize::parse_panel_segments(&records),
            Err(e) => {
                debug!("panel endpoint failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::types::{CaptionTrack, Captions, PanelRun, PanelSnippet, TracklistRenderer};

    fn player_with_track(base_url: &str) -> PlayerResponse {
        PlayerResponse {
            captions: Some(Captions {
                player_captions_tracklist_renderer: Some(TracklistRenderer {
                    caption_tracks: vec![CaptionTrack {
                        language_code: "en".into(),
                        kind: None,
                        base_url: base_url.into(),
                    }],
                }),
            }),
        }
    }

    fn json3(texts: &[&str]) -> Json3Root {
        serde_json::from_value(serde_json::json!({
            "events": texts
                .iter()
                .enumerate()
                .map(|(i, t)| serde_json::json!({
                    "tStartMs": i * 500,
                    "dDurationMs": 500,
                    "segs": [{ "utf8": t }]
                }))
                .collect::<Vec<_>>()
        }))
        .unwrap()
    }

    /// Configurable source: each surface either errors, returns empty, or
    /// returns canned data.
    #[derive(Default)]
    struct CannedSource {
        json3: Option<Json3Root>,
        json3_errors: bool,
        xml: Option<String>,
        player: Option<PlayerResponse>,
        panel: Option<Vec<PanelSegment>>,
    }

    #[async_trait]
    impl CaptionSource for CannedSource {
        async fn caption_json3(&self, _base_url: &str) -> Result<Json3Root> {
            if self.json3_errors {
                return Err(FetchError::Config("json3 unavailable".into()));
            }
            Ok(self.json3.clone().unwrap_or_default())
        }

        async fn caption_xml(&self, _base_url: &str) -> Result<String> {
            self.xml
                .clone()
                .ok_or_else(|| FetchError::Config("xml unavailable".into()))
        }

        async fn player(
            &self,
            _api_key: &str,
            _client_version: &str,
            _video_id: &str,
        ) -> Result<PlayerResponse> {
            self.player
                .clone()
                .ok_or_else(|| FetchError::Config("player unavailable".into()))
        }

        async fn transcript_panel(
            &self,
            _api_key: &str,
            _client_version: &str,
            _video_id: &str,
        ) -> Result<Vec<PanelSegment>> {
            self.panel
                .clone()
                .ok_or_else(|| FetchError::Config("panel unavailable".into()))
        }
    }

    fn chain(source: CannedSource) -> ExtractionChain {
        ExtractionChain::new(Arc::new(source), "en".into())
    }

    fn globals_with_player(base_url: &str) -> PageGlobals {
        PageGlobals {
            player_response: Some(player_with_track(base_url)),
            api_key: Some("key".into()),
            client_version: Some("1.0".into()),
        }
    }

    #[tokio::test]
    async fn method_one_prefers_json3() {
        let source = CannedSource {
            json3: Some(json3(&["Never", "gonna", "give"])),
            ..Default::default()
        };
        let segments = chain(source)
            .run(&globals_with_player("https://example/tt"), "dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "Never");
        assert_eq!(segments[1].start, 0.5);
    }

    #[tokio::test]
    async fn method_one_falls_back_to_xml() {
        let source = CannedSource {
            json3_errors: true,
            xml: Some(r#"<text start="0" dur="1">from xml</text>"#.into()),
            ..Default::default()
        };
        let segments = chain(source)
            .run(&globals_with_player("https://example/tt"), "vid")
            .await
            .unwrap();
        assert_eq!(segments[0].text, "from xml");
    }

    #[tokio::test]
    async fn throwing_method_one_still_reaches_later_methods() {
        // Method 1's fetches error, method 2's player endpoint errors; the
        // chain must still reach method 3.
        let source = CannedSource {
            json3_errors: true,
            panel: Some(vec![PanelSegment {
                start_ms: "0".into(),
                end_ms: "800".into(),
                snippet: Some(PanelSnippet {
                    runs: vec![PanelRun {
                        text: "from panel".into(),
                    }],
                }),
            }]),
            ..Default::default()
        };
        let segments = chain(source)
            .run(&globals_with_player("https://example/tt"), "vid")
            .await
            .unwrap();
        assert_eq!(segments[0].text, "from panel");
    }

    #[tokio::test]
    async fn missing_key_and_player_data_exhausts_chain() {
        let globals = PageGlobals::default();
        let result = chain(CannedSource::default()).run(&globals, "vid").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn method_two_uses_innertube_track_list() {
        let source = CannedSource {
            player: Some(player_with_track("https://example/api-track")),
            json3: Some(json3(&["via api"])),
            ..Default::default()
        };
        // No embedded player response, so method 1 is skipped outright.
        let globals = PageGlobals {
            player_response: None,
            api_key: Some("key".into()),
            client_version: None,
        };
        let segments = chain(source).run(&globals, "vid").await.unwrap();
        assert_eq!(segments[0].text, "via api");
    }

    #[tokio::test]
    async fn empty_parse_results_fall_through() {
        // json3 parses to zero segments everywhere; panel has content.
        let source = CannedSource {
            json3: Some(Json3Root::default()),
            player: Some(player_with_track("https://example/api-track")),
            panel: Some(vec![PanelSegment {
                start_ms: "100".into(),
                end_ms: "200".into(),
                snippet: Some(PanelSnippet {
                    runs: vec![PanelRun { text: "last resort".into() }],
                }),
            }]),
            ..Default::default()
        };
        let segments = chain(source)
            .run(&globals_with_player("https://example/tt"), "vid")
            .await
            .unwrap();
        assert_eq!(segments[0].text, "last resort");
    }
}
