//! Error type shared by the engine, the client and the server.

use thiserror::Error;

/// Everything that can go wrong in a test run or an endpoint.
#[derive(Debug, Error)]
pub enum NetgaugeError {
    /// Transport-level HTTP failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    /// Every latency probe failed.
    #[error("latency unavailable: every probe failed")]
    LatencyUnavailable,
    /// A request did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// A worker or run task panicked.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The server URL does not parse.
    #[error("bad server URL: {0}")]
    BadUrl(#[from] url::ParseError),
    /// JSON encoding or decoding failed.
    #[error("serialize/deserialize error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Socket or output failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetgaugeError>;
