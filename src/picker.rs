//! Element-picker activation and outcome forwarding.
//!
//! The picker overlay itself is page UI and out of scope here; this module
//! owns its lifecycle contract: injection into a caller-specified visible
//! tab, an independent 60-second self-cancellation timer, and best-effort
//! forwarding of outcomes to whichever display surface is currently
//! subscribed.

use crate::coordinator::{Coordinator, CoordinatorMessage};
use crate::error::{FetchError, Result};
use crate::host::TabId;
use crate::relay::{Envelope, Origin, Payload};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fixed source tag on picker outcome envelopes.
pub const PICKER_SOURCE: &str = "yt-transcript-picker";

/// Picker outcomes as seen by the display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    UrlSelected(String),
    PickerCancelled,
    PickerTimeout,
}

/// Inject the picker into a visible tab and start listening for its
/// outcome. Returns once injection succeeded; outcomes arrive later through
/// the coordinator's surface broadcast.
pub async fn activate(coordinator: &Coordinator, tab: TabId) -> Result<()> {
    let page = coordinator
        .host()
        .relay_world(tab)
        .await
        .map_err(|e| FetchError::InjectionFailure(e.to_string()))?;
    spawn_listener(page.subscribe(), coordinator.clone());
    Ok(())
}

fn spawn_listener(
    mut bus: broadcast::Receiver<Envelope>,
    coordinator: Coordinator,
) -> JoinHandle<()> {
    let self_cancel = coordinator.config().picker_timeout;
    tokio::spawn(async move {
        let deadline = tokio::time::sleep(self_cancel);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("picker self-cancelled");
                    coordinator
                        .handle_message(CoordinatorMessage::PickerTimeout)
                        .await;
                    break;
                }
                received = bus.recv() => {
                    let envelope = match received {
                        Ok(envelope) => envelope,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    };
                    if envelope.source != PICKER_SOURCE || envelope.origin != Origin::Page {
                        continue;
                    }
                    match envelope.payload {
                        Payload::UrlSelected(url) => {
                            coordinator
                                .handle_message(CoordinatorMessage::UrlSelected { url })
                                .await;
                            break;
                        }
                        Payload::PickerCancelled => {
                            coordinator
                                .handle_message(CoordinatorMessage::PickerCancelled)
                                .await;
                            break;
                        }
                        _ => continue,
                    }
                }
            }
        }
    })
}
