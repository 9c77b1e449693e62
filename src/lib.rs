//! Transcript extraction for videos on a third-party streaming site.
//!
//! The core is a multi-strategy extraction pipeline with a cross-context
//! message relay: the [`coordinator::Coordinator`] opens a hidden tab
//! through a [`host::TabHost`], injects a relay and a page-context prober
//! into two script worlds, awaits the relayed result under a bounded
//! timeout, and guarantees teardown of the tab on every outcome. The prober
//! runs the ordered [`strategy::ExtractionChain`] over the page's script
//! globals and normalizes whatever it finds into one canonical segment
//! list.

// helper.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod host;
pub mod innertube;
pub mod normalize;
pub mod page;
pub mod picker;
pub mod prober;
pub mod relay;
pub mod strategy;
pub mod track;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorMessage, MessageResponse};
pub use error::{FetchError, Result};
pub use host::{HttpTabHost, TabHost};
pub use innertube::InnertubeClient;
pub use types::{TranscriptResult, TranscriptSegment};
