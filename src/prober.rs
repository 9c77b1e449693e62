//! Page-context prober.
//!
//! Runs with access to the hidden page's own script globals; its only output
//! channel is the tagged broadcast onto the page bus. Resolves the video id
//! and a display title, runs the extraction chain, and dispatches exactly
//! one success or error envelope.

use crate::error::FetchError;
use crate::host::Page;
use crate::page::{self, UNKNOWN_TITLE};
use crate::relay::{Envelope, Origin, Payload, PROBE_SOURCE};
use crate::strategy::ExtractionChain;
use crate::types::TranscriptResult;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the prober in a tab's main world.
pub fn spawn(
    page: Arc<Page>,
    chain: ExtractionChain,
    language: String,
    track_label: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        probe(&page, chain, language, track_label).await;
    })
}

async fn probe(page: &Page, chain: ExtractionChain, language: String, track_label: String) {
    let Some(video_id) = page::video_id_from_location(&page.url) else {
        dispatch(page, Payload::Error(FetchError::NoVideoId.to_string()));
        return;
    };

    let title = page::page_title(&page.html).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    info!(video_id, title, "probing for transcript");

    let globals = page::scrape_globals(&page.html);
    match chain.run(&globals, &video_id).await {
        Some(transcript) => {
            debug!(segments = transcript.len(), "probe succeeded");
            dispatch(
                page,
                Payload::Success(TranscriptResult {
                    title,
                    transcript,
                    language,
                    track_name: track_label,
                }),
            );
        }
        None => {
            dispatch(
                page,
                Payload::Error(FetchError::NoCaptionsAvailable.to_string()),
            );
        }
    }
}

fn dispatch(page: &Page, payload: Payload) {
    page.broadcast(Envelope {
        source: PROBE_SOURCE.to_string(),
        origin: Origin::Page,
        payload,
    });
}
