//! Runtime configuration for the fetch pipeline.

use std::time::Duration;

/// Pipeline configuration.
///
/// The timeout values reproduce the observed behavior of the extraction
/// pipeline: a bounded wait for the hidden tab to load, a fixed settling
/// delay for the host page's own scripts, and a bounded wait for the relayed
/// result. The picker timer is independent of the fetch timers.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the host site.
    pub base_url: String,
    /// Target caption language code.
    pub language: String,
    /// Display label reported for the selected track.
    pub track_label: String,
    /// Bound on waiting for the hidden tab's load-complete signal.
    pub load_timeout: Duration,
    /// Fixed delay after load-complete before injecting scripts.
    pub settle_delay: Duration,
    /// Bound on waiting for the relayed extraction result.
    pub result_timeout: Duration,
    /// Self-cancellation timer for the element picker.
    pub picker_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            language: "en".to_string(),
            track_label: "English".to_string(),
            load_timeout: Duration::from_secs(15),
            settle_delay: Duration::from_secs(3),
            result_timeout: Duration::from_secs(20),
            picker_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Build the watch-page URL for a video id.
    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={}", self.base_url.trim_end_matches('/'), video_id)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }
        if self.language.is_empty() {
            return Err("Target language must not be empty".to_string());
        }
        Ok(())
    }
}
