//! HTTP client for the host site's internal endpoints.
//!
//! Covers the three network surfaces the extraction methods hit: the caption
//! data behind a track's `baseUrl` (json3 or timed-text XML form), the
//! `/youtubei/v1/player` endpoint, and the `/youtubei/v1/get_transcript`
//! panel endpoint. All schemas are upstream-owned and probed defensively.

use crate::config::Config;
use crate::error::Result;
use crate::strategy::CaptionSource;
use crate::types::{Json3Root, PanelSegment, PlayerResponse};
use async_trait::async_trait;
use base64::prelude::*;
use std::sync::Arc;

/// Client version used when the page configuration does not expose one.
pub const DEFAULT_CLIENT_VERSION: &str = "2.20240101.00.00";

/// Client for the internal "innertube" API.
#[derive(Clone)]
pub struct InnertubeClient {
    inner: Arc<InnertubeClientInner>,
}

struct InnertubeClientInner {
    base_url: String,
    http_client: reqwest::Client,
}

impl InnertubeClient {
    /// Create a new client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self {
            inner: Arc::new(InnertubeClientInner {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                http_client,
            }),
        })
    }

    /// Build a URL for an innertube API endpoint.
    fn endpoint(&self, name: &str, api_key: &str) -> String {
        format!("{}/youtubei/v1/{}?key={}", self.inner.base_url, name, api_key)
    }

    /// The WEB client descriptor sent with every innertube request.
    fn client_context(client_version: &str) -> serde_json::Value {
        serde_json::json!({
            "client": {
                "clientName": "WEB",
                "clientVersion": client_version,
                "hl": "en",
                "gl": "US"
            }
        })
    }

    /// Opaque request parameter for the transcript panel endpoint, derived
    /// from the video id. Best-effort encoding of the observed protocol.
    pub fn transcript_params(video_id: &str) -> String {
        BASE64_STANDARD.encode(format!("\n\x0b{video_id}"))
    }
}

#[async_trait]
impl CaptionSource for InnertubeClient {
    async fn caption_json3(&self, base_url: &str) -> Result<Json3Root> {
        let sep = if base_url.contains('?') { '&' } else { '?' };
        let url = format!("{base_url}{sep}fmt=json3");
        let response = self
            .inner
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn caption_xml(&self, base_url: &str) -> Result<String> {
        let response = self
            .inner
            .http_client
            .get(base_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn player(
        &self,
        api_key: &str,
        client_version: &str,
        video_id: &str,
    ) -> Result<PlayerResponse> {
        let body = serde_json::json!({
            "videoId": video_id,
            "context": Self::client_context(client_version),
        });
        let response = self
            .inner
            .http_client
            .post(self.endpoint("player", api_key))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn transcript_panel(
        &self,
        api_key: &str,
        client_version: &str,
        video_id: &str,
    ) -> Result<Vec<PanelSegment>> {
        let body = serde_json::json!({
            "context": Self::client_context(client_version),
            "params": Self::transcript_params(video_id),
        });
        let response = self
            .inner
            .http_client
            .post(self.endpoint("get_transcript", api_key))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let value: serde_json::Value = response.json().await?;
        Ok(panel_segments_from_response(&value))
    }
}

/// Dig the segment list out of the panel endpoint's nested response.
///
/// Two nestings have been observed in the wild; both are probed.
pub fn panel_segments_from_response(value: &serde_json::Value) -> Vec<PanelSegment> {
    let renderer = value
        .pointer("/actions/0/updateEngagementPanelAction/content/transcriptRenderer");
    let segments = renderer
        .and_then(|r| {
            r.pointer(
                "/content/transcriptSearchPanelRenderer/body/transcriptSegmentListRenderer/initialSegments",
            )
            .or_else(|| r.pointer("/body/transcriptSegmentListRenderer/initialSegments"))
        })
        .and_then(|v| v.as_array());

    let Some(segments) = segments else {
        return Vec::new();
    };

    segments
        .iter()
        .filter_map(|s| s.get("transcriptSegmentRenderer"))
        .filter_map(|r| serde_json::from_value(r.clone()).ok())
        .collect()
}
