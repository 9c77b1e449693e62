//! End-to-end coordinator scenarios under a paused clock.

use super::fixtures::*;
use crate::config::Config;
use crate::coordinator::{Coordinator, CoordinatorMessage, MessageResponse};
use crate::error::FetchError;
use crate::host::TabHost;
use crate::picker::{SurfaceEvent, PICKER_SOURCE};
use crate::relay::{Envelope, Origin, Payload};
use crate::types::TranscriptSegment;
use std::sync::Arc;
use std::time::Duration;

fn coordinator(host: Arc<MockTabHost>, source: Arc<dyn crate::strategy::CaptionSource>) -> Coordinator {
    Coordinator::new(host, source, Config::default())
}

#[tokio::test(start_paused = true)]
async fn successful_fetch_normalizes_and_tears_down() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let source = Arc::new(DelayedSource::immediate(rick_roll_json3()));
    let coordinator = coordinator(host.clone(), source);

    let result = coordinator.fetch_transcript("dQw4w9WgXcQ").await.unwrap();

    assert_eq!(result.title, "Test Video");
    assert_eq!(result.language, "en");
    assert_eq!(result.track_name, "English");
    assert_eq!(
        result.transcript,
        vec![
            TranscriptSegment { start: 0.0, duration: 0.5, text: "Never".into() },
            TranscriptSegment { start: 0.5, duration: 0.5, text: "gonna".into() },
            TranscriptSegment { start: 1.0, duration: 0.5, text: "give".into() },
        ]
    );
    assert_eq!(host.created(), 1);
    assert_eq!(host.removed(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_player_data_and_no_key_exhausts_chain() {
    let host = Arc::new(MockTabHost::new(BARE_HTML));
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));

    let err = coordinator.fetch_transcript("dQw4w9WgXcQ").await.unwrap_err();
    match err {
        FetchError::Probe(message) => {
            assert_eq!(message, "No transcript available for this video")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(host.created(), host.removed());
}

#[tokio::test(start_paused = true)]
async fn load_timeout_still_tears_down() {
    let host = Arc::new(
        MockTabHost::new(WATCH_HTML).with_load_delay(Duration::from_secs(30)),
    );
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));

    let err = coordinator.fetch_transcript("dQw4w9WgXcQ").await.unwrap_err();
    assert!(matches!(err, FetchError::TabLoadTimeout));
    assert_eq!(host.created(), 1);
    assert_eq!(host.removed(), 1);
}

#[tokio::test(start_paused = true)]
async fn late_result_resolves_result_timeout() {
    // The caption fetch completes 25 s in, past the 20 s result bound.
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let source = Arc::new(DelayedSource {
        json3: rick_roll_json3(),
        delay: Duration::from_secs(25),
    });
    let coordinator = coordinator(host.clone(), source);

    let err = coordinator.fetch_transcript("dQw4w9WgXcQ").await.unwrap_err();
    assert!(matches!(err, FetchError::ResultTimeout));
    assert_eq!(host.created(), 1);
    assert_eq!(host.removed(), 1);
}

#[tokio::test(start_paused = true)]
async fn prober_injection_failure_resolves_immediately() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML).with_failing_prober_injection());
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));

    let err = coordinator.fetch_transcript("dQw4w9WgXcQ").await.unwrap_err();
    assert!(matches!(err, FetchError::InjectionFailure(_)));
    assert_eq!(host.created(), 1);
    assert_eq!(host.removed(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_fetch_is_rejected() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let source = Arc::new(DelayedSource {
        json3: rick_roll_json3(),
        delay: Duration::from_secs(5),
    });
    let coordinator = coordinator(host.clone(), source);

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.fetch_transcript("dQw4w9WgXcQ").await })
    };
    // Let the first fetch take the gate.
    tokio::task::yield_now().await;

    let err = coordinator.fetch_transcript("other-video").await.unwrap_err();
    assert!(matches!(err, FetchError::FetchInFlight));

    assert!(first.await.unwrap().is_ok());
    assert_eq!(host.created(), 1);
    assert_eq!(host.removed(), 1);
}

#[tokio::test]
async fn relay_message_without_pending_request_is_a_noop() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let coordinator = coordinator(host, Arc::new(NoDataSource));

    let response = coordinator
        .handle_message(CoordinatorMessage::TranscriptError {
            error: "stale".into(),
        })
        .await;
    assert!(matches!(response, MessageResponse::Ack));
}

async fn loaded_tab(host: &MockTabHost) -> crate::host::TabId {
    let tab = host.create_tab("https://www.youtube.com/").await.unwrap();
    host.wait_for_load(tab).await.unwrap();
    tab
}

#[tokio::test(start_paused = true)]
async fn picker_outcome_reaches_display_surface() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));
    let mut surface = coordinator.subscribe_surface();

    let tab = loaded_tab(&host).await;
    let response = coordinator
        .handle_message(CoordinatorMessage::ActivatePicker { tab_id: tab })
        .await;
    assert!(matches!(response, MessageResponse::Ack));

    let page = host.relay_world(tab).await.unwrap();
    page.broadcast(Envelope {
        source: PICKER_SOURCE.into(),
        origin: Origin::Page,
        payload: Payload::UrlSelected("https://www.youtube.com/watch?v=dQw4w9WgXcQ".into()),
    });

    assert_eq!(
        surface.recv().await.unwrap(),
        SurfaceEvent::UrlSelected("https://www.youtube.com/watch?v=dQw4w9WgXcQ".into())
    );
}

#[tokio::test(start_paused = true)]
async fn picker_self_cancels_after_a_minute() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));
    let mut surface = coordinator.subscribe_surface();

    let tab = loaded_tab(&host).await;
    coordinator
        .handle_message(CoordinatorMessage::ActivatePicker { tab_id: tab })
        .await;

    assert_eq!(surface.recv().await.unwrap(), SurfaceEvent::PickerTimeout);
}

#[tokio::test(start_paused = true)]
async fn picker_outcome_without_surface_is_dropped() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));

    let tab = loaded_tab(&host).await;
    coordinator
        .handle_message(CoordinatorMessage::ActivatePicker { tab_id: tab })
        .await;

    let page = host.relay_world(tab).await.unwrap();
    page.broadcast(Envelope {
        source: PICKER_SOURCE.into(),
        origin: Origin::Page,
        payload: Payload::PickerCancelled,
    });
    // No subscriber attached: the forward must be dropped silently.
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn picker_activation_on_unloaded_tab_fails() {
    let host = Arc::new(MockTabHost::new(WATCH_HTML));
    let coordinator = coordinator(host.clone(), Arc::new(NoDataSource));

    let tab = host.create_tab("https://www.youtube.com/").await.unwrap();
    let response = coordinator
        .handle_message(CoordinatorMessage::ActivatePicker { tab_id: tab })
        .await;
    assert!(matches!(response, MessageResponse::Failed(_)));
}
