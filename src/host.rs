//! Hidden-tab hosting.
//!
//! [`TabHost`] is the browser surface the coordinator drives: create a
//! non-focused tab, wait for its navigation to complete, obtain injection
//! points for the two script worlds, and close it. The production host
//! navigates over HTTP and exposes the fetched document; tests substitute a
//! mock that can fail injection or never finish loading.

use crate::error::{FetchError, Result};
use crate::relay::Envelope;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Handle to one open tab.
pub type TabId = u64;

/// A loaded page: the document snapshot plus the in-page broadcast bus that
/// injected scripts communicate over.
pub struct Page {
    /// Final location of the page.
    pub url: String,
    /// Raw document, carrying the inline script globals.
    pub html: String,
    bus: broadcast::Sender<Envelope>,
}

impl Page {
    pub fn new(url: String, html: String) -> Self {
        let (bus, _) = broadcast::channel(16);
        Self { url, html, bus }
    }

    /// Broadcast an envelope into the page. With no listener attached the
    /// envelope is dropped.
    pub fn broadcast(&self, envelope: Envelope) {
        if self.bus.send(envelope).is_err() {
            debug!("page bus has no listener; envelope dropped");
        }
    }

    /// Subscribe to the page's broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.bus.subscribe()
    }
}

/// The browser surface the coordinator drives.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Open a new, non-focused tab for a URL.
    async fn create_tab(&self, url: &str) -> Result<TabId>;

    /// Wait for the tab's navigation-complete signal. The caller bounds this
    /// with its own timeout.
    async fn wait_for_load(&self, tab: TabId) -> Result<()>;

    /// Injection point for the isolated (privileged) world: where the relay
    /// and the picker listener attach.
    async fn relay_world(&self, tab: TabId) -> Result<Arc<Page>>;

    /// Injection point for the page's own (main) world: where the prober
    /// runs with access to page globals.
    async fn page_world(&self, tab: TabId) -> Result<Arc<Page>>;

    /// Close the tab. Closing an already-gone tab is an error the caller
    /// ignores.
    async fn remove_tab(&self, tab: TabId) -> Result<()>;
}

struct TabSlot {
    url: String,
    page: Option<Arc<Page>>,
}

/// HTTP-backed host: "navigation" fetches the document once and the loaded
/// page is the response body.
pub struct HttpTabHost {
    http_client: reqwest::Client,
    tabs: Mutex<HashMap<TabId, TabSlot>>,
    next_id: AtomicU64,
}

impl HttpTabHost {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self {
            http_client,
            tabs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    fn loaded_page(&self, tab: TabId) -> Result<Arc<Page>> {
        let tabs = self.tabs.lock().unwrap();
        tabs.get(&tab)
            .and_then(|slot| slot.page.clone())
            .ok_or(FetchError::TabClosed(tab))
    }
}

#[async_trait]
impl TabHost for HttpTabHost {
    async fn create_tab(&self, url: &str) -> Result<TabId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut tabs = self.tabs.lock().unwrap();
        tabs.insert(
            id,
            TabSlot {
                url: url.to_string(),
                page: None,
            },
        );
        debug!(tab = id, url, "created hidden tab");
        Ok(id)
    }

    async fn wait_for_load(&self, tab: TabId) -> Result<()> {
        let url = {
            let tabs = self.tabs.lock().unwrap();
            tabs.get(&tab)
                .map(|slot| slot.url.clone())
                .ok_or(FetchError::TabClosed(tab))?
        };

        let response = self.http_client.get(&url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!(tab, bytes = html.len(), "tab finished loading");

        let mut tabs = self.tabs.lock().unwrap();
        let slot = tabs.get_mut(&tab).ok_or(FetchError::TabClosed(tab))?;
        slot.page = Some(Arc::new(Page::new(final_url, html)));
        Ok(())
    }

    async fn relay_world(&self, tab: TabId) -> Result<Arc<Page>> {
        self.loaded_page(tab)
    }

    async fn page_world(&self, tab: TabId) -> Result<Arc<Page>> {
        self.loaded_page(tab)
    }

    async fn remove_tab(&self, tab: TabId) -> Result<()> {
        let mut tabs = self.tabs.lock().unwrap();
        tabs.remove(&tab)
            .map(|_| debug!(tab, "removed hidden tab"))
            .ok_or(FetchError::TabClosed(tab))
    }
}
