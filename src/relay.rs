//! In-page broadcast envelope and the relay task.
//!
//! The prober runs in the page's own context and cannot reach the
//! coordinator; the relay runs in the privileged isolated context of the
//! same tab and cannot see page globals. The two meet on the page bus: a
//! tagged envelope channel the relay filters and forwards one-directionally
//! to the coordinator.

use crate::types::TranscriptResult;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fixed source tag on every envelope the prober broadcasts.
pub const PROBE_SOURCE: &str = "youtube-transcript-fetcher";

/// Where a broadcast originated. Envelopes from embedded frames are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Page,
    Frame,
}

/// One message on a tab's in-page bus.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub source: String,
    pub origin: Origin,
    pub payload: Payload,
}

#[derive(Debug, Clone)]
pub enum Payload {
    /// Prober succeeded; carries the normalized result.
    Success(TranscriptResult),
    /// Prober failed; carries a human-readable message.
    Error(String),
    /// Picker outcome: the user clicked a video link.
    UrlSelected(String),
    /// Picker outcome: dismissed with Escape.
    PickerCancelled,
    /// Picker outcome: the self-cancellation timer fired.
    PickerTimeout,
}

/// What the relay forwards to the coordinator.
#[derive(Debug, Clone)]
pub enum RelayMessage {
    Result(TranscriptResult),
    Error(String),
}

/// Spawn the relay: filter the page bus and forward prober outcomes to the
/// coordinator channel. Stateless; no retry, no buffering.
pub fn spawn(
    mut bus: broadcast::Receiver<Envelope>,
    coordinator: mpsc::Sender<RelayMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let envelope = match bus.recv().await {
                Ok(envelope) => envelope,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("relay lagged, skipped {} envelopes", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if envelope.source != PROBE_SOURCE || envelope.origin != Origin::Page {
                debug!(source = %envelope.source, "relay rejected envelope");
                continue;
            }

            let message = match envelope.payload {
                Payload::Success(data) => RelayMessage::Result(data),
                Payload::Error(error) => RelayMessage::Error(error),
                // Picker traffic is not the relay's concern.
                _ => continue,
            };
            if coordinator.send(message).await.is_err() {
                break;
            }
        }
    })
}
