//! Error types for the transcript fetch pipeline.

use thiserror::Error;

/// Main error type for the fetcher.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No video id could be resolved from the page location.
    #[error("No video ID found")]
    NoVideoId,

    /// Every extraction method was attempted and none produced a segment.
    #[error("No transcript available for this video")]
    NoCaptionsAvailable,

    /// The hidden tab did not reach load-complete within the bound.
    #[error("Tab load timeout")]
    TabLoadTimeout,

    /// No relay message arrived within the result bound.
    #[error("Transcript fetch timed out")]
    ResultTimeout,

    /// Script injection into the hidden tab failed.
    #[error("Script injection failed: {0}")]
    InjectionFailure(String),

    /// A fetch was requested while another is still outstanding.
    #[error("A transcript fetch is already in flight")]
    FetchInFlight,

    /// The tab is gone or was never loaded.
    #[error("Tab not found: {0}")]
    TabClosed(u64),

    /// The prober reported an error through the relay.
    #[error("{0}")]
    Probe(String),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, FetchError>;
