//! Wire types of the speed test endpoints and the test lifecycle enums.

use serde::{Deserialize, Serialize};

/// Body returned by the ping endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReply {
    /// Server wall clock in milliseconds since the Unix epoch.
    pub time: u64,
}

/// Body returned by the upload sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Number of body bytes the server consumed.
    pub received: u64,
    /// Server wall clock in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Direction of a throughput phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Server-to-client transfer.
    Download,
    /// Client-to-server transfer.
    Upload,
}

/// Phase of a test run. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPhase {
    /// No run has started yet.
    #[default]
    Idle,
    /// Latency probing.
    Ping,
    /// Download throughput window.
    Download,
    /// Upload throughput window.
    Upload,
    /// Run finished, with whatever results were gathered.
    Completed,
}

impl TestPhase {
    /// Whether a new run may start from this phase.
    pub fn is_at_rest(self) -> bool {
        matches!(self, TestPhase::Idle | TestPhase::Completed)
    }
}

impl From<Direction> for TestPhase {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Download => TestPhase::Download,
            Direction::Upload => TestPhase::Upload,
        }
    }
}

/// Milliseconds since the Unix epoch, as reported by the endpoints.
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
