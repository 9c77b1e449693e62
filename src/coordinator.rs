//! Background coordinator.
//!
//! Orchestrates one fetch end to end: open a hidden tab, wait for load
//! (bounded), let the page settle, inject the relay and then the prober,
//! await the relayed result (bounded), and tear the tab down on every path.
//! Also carries the message surface: picker activation, relay intake, and
//! best-effort forwarding of picker outcomes to the display surface.

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::host::{TabHost, TabId};
use crate::picker::{self, SurfaceEvent};
use crate::prober;
use crate::relay::{self, RelayMessage};
use crate::strategy::{CaptionSource, ExtractionChain};
use crate::types::TranscriptResult;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Correlation key for the single pending request slot.
const PENDING_KEY: &str = "transcript";

/// Messages the coordinator dispatches on.
#[derive(Debug)]
pub enum CoordinatorMessage {
    /// Inject the element picker into a visible tab.
    ActivatePicker { tab_id: TabId },
    /// Fetch a transcript through a hidden tab.
    FetchTranscript { video_id: String },
    /// Relay-forwarded prober success.
    TranscriptResult { data: TranscriptResult },
    /// Relay-forwarded prober failure.
    TranscriptError { error: String },
    /// Picker outcome, forwarded to the display surface.
    UrlSelected { url: String },
    /// Picker outcome, forwarded to the display surface.
    PickerCancelled,
    /// Picker outcome, forwarded to the display surface.
    PickerTimeout,
}

/// Reply to one dispatched message.
#[derive(Debug)]
pub enum MessageResponse {
    Ack,
    Transcript(TranscriptResult),
    Failed(String),
}

struct PendingRequest {
    key: &'static str,
    resolver: oneshot::Sender<Result<TranscriptResult>>,
}

/// The coordinator. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    host: Arc<dyn TabHost>,
    source: Arc<dyn CaptionSource>,
    config: Config,
    /// Single-slot correlation record. At most one entry at a time.
    pending: Mutex<Option<PendingRequest>>,
    /// Makes the one-fetch-in-flight contract explicit: a second concurrent
    /// fetch is rejected instead of racing the slot.
    fetch_gate: tokio::sync::Mutex<()>,
    surface: broadcast::Sender<SurfaceEvent>,
}

impl Coordinator {
    pub fn new(host: Arc<dyn TabHost>, source: Arc<dyn CaptionSource>, config: Config) -> Self {
        let (surface, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(CoordinatorInner {
                host,
                source,
                config,
                pending: Mutex::new(None),
                fetch_gate: tokio::sync::Mutex::new(()),
                surface,
            }),
        }
    }

    pub(crate) fn host(&self) -> &Arc<dyn TabHost> {
        &self.inner.host
    }

    pub(crate) fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Subscribe as the display surface. Picker outcomes are forwarded here
    /// best-effort; with no subscriber attached they are dropped silently.
    pub fn subscribe_surface(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.inner.surface.subscribe()
    }

    /// Dispatch one message.
    pub async fn handle_message(&self, message: CoordinatorMessage) -> MessageResponse {
        match message {
            CoordinatorMessage::ActivatePicker { tab_id } => {
                match picker::activate(self, tab_id).await {
                    Ok(()) => MessageResponse::Ack,
                    Err(e) => MessageResponse::Failed(e.to_string()),
                }
            }
            CoordinatorMessage::FetchTranscript { video_id } => {
                match self.fetch_transcript(&video_id).await {
                    Ok(data) => MessageResponse::Transcript(data),
                    Err(e) => MessageResponse::Failed(e.to_string()),
                }
            }
            CoordinatorMessage::TranscriptResult { data } => {
                self.resolve_pending(Ok(data));
                MessageResponse::Ack
            }
            CoordinatorMessage::TranscriptError { error } => {
                self.resolve_pending(Err(FetchError::Probe(error)));
                MessageResponse::Ack
            }
            CoordinatorMessage::UrlSelected { url } => {
                self.forward_to_surface(SurfaceEvent::UrlSelected(url));
                MessageResponse::Ack
            }
            CoordinatorMessage::PickerCancelled => {
                self.forward_to_surface(SurfaceEvent::PickerCancelled);
                MessageResponse::Ack
            }
            CoordinatorMessage::PickerTimeout => {
                self.forward_to_surface(SurfaceEvent::PickerTimeout);
                MessageResponse::Ack
            }
        }
    }

    /// Fetch a transcript through a hidden tab.
    ///
    /// Exactly one hidden tab is created and destroyed per call, on every
    /// outcome. A call while another fetch is outstanding fails with
    /// `FetchInFlight`.
    pub async fn fetch_transcript(&self, video_id: &str) -> Result<TranscriptResult> {
        let _gate = self
            .inner
            .fetch_gate
            .try_lock()
            .map_err(|_| FetchError::FetchInFlight)?;

        let url = self.inner.config.watch_url(video_id);
        info!(video_id, "opening hidden tab");
        let tab = self.inner.host.create_tab(&url).await?;

        let result = self.run_pipeline(tab).await;

        // Teardown runs regardless of outcome; closure errors are ignored.
        if let Err(e) = self.inner.host.remove_tab(tab).await {
            debug!("tab close ignored: {}", e);
        }

        match &result {
            Ok(data) => info!(segments = data.transcript.len(), "fetch resolved"),
            Err(e) => warn!("fetch failed: {}", e),
        }
        result
    }

    async fn run_pipeline(&self, tab: TabId) -> Result<TranscriptResult> {
        let config = &self.inner.config;

        timeout(config.load_timeout, self.inner.host.wait_for_load(tab))
            .await
            .map_err(|_| FetchError::TabLoadTimeout)??;

        // The page's readiness cannot be observed directly; give its own
        // scripts a fixed window to populate the globals the prober reads.
        sleep(config.settle_delay).await;

        let relay_page = self
            .inner
            .host
            .relay_world(tab)
            .await
            .map_err(|e| FetchError::InjectionFailure(e.to_string()))?;
        let (relay_tx, relay_rx) = mpsc::channel(4);
        relay::spawn(relay_page.subscribe(), relay_tx);
        self.spawn_relay_intake(relay_rx);

        let (resolver, done) = oneshot::channel();
        self.register_pending(resolver);

        let probe_page = match self.inner.host.page_world(tab).await {
            Ok(page) => page,
            Err(e) => {
                self.clear_pending();
                return Err(FetchError::InjectionFailure(e.to_string()));
            }
        };
        let chain = ExtractionChain::new(self.inner.source.clone(), config.language.clone());
        prober::spawn(
            probe_page,
            chain,
            config.language.clone(),
            config.track_label.clone(),
        );

        match timeout(config.result_timeout, done).await {
            Ok(Ok(result)) => result,
            // Resolver dropped without sending; treat like a missed result.
            Ok(Err(_)) => Err(FetchError::ResultTimeout),
            Err(_) => {
                self.clear_pending();
                Err(FetchError::ResultTimeout)
            }
        }
    }

    /// Route relay messages through the message surface.
    fn spawn_relay_intake(&self, mut relay_rx: mpsc::Receiver<RelayMessage>) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            while let Some(message) = relay_rx.recv().await {
                let message = match message {
                    RelayMessage::Result(data) => CoordinatorMessage::TranscriptResult { data },
                    RelayMessage::Error(error) => CoordinatorMessage::TranscriptError { error },
                };
                coordinator.handle_message(message).await;
            }
        });
    }

    fn register_pending(&self, resolver: oneshot::Sender<Result<TranscriptResult>>) {
        let mut slot = self.inner.pending.lock().unwrap();
        debug_assert!(slot.is_none(), "pending slot already occupied");
        *slot = Some(PendingRequest {
            key: PENDING_KEY,
            resolver,
        });
    }

    /// Resolve the pending slot. Exactly one resolution is honored: a second
    /// message for an already-cleared slot is a no-op.
    fn resolve_pending(&self, result: Result<TranscriptResult>) -> bool {
        let request = self.inner.pending.lock().unwrap().take();
        match request {
            Some(request) => {
                debug_assert_eq!(request.key, PENDING_KEY);
                let _ = request.resolver.send(result);
                true
            }
            None => {
                debug!("no pending request; relay message dropped");
                false
            }
        }
    }

    fn clear_pending(&self) {
        self.inner.pending.lock().unwrap().take();
    }

    fn forward_to_surface(&self, event: SurfaceEvent) {
        // Best-effort: delivery is not guaranteed if no listener is attached
        // at forward time.
        if self.inner.surface.send(event).is_err() {
            debug!("no display surface attached; event dropped");
        }
    }
}
