//! Run results and the snapshot published to front ends.

use serde::Serialize;

use crate::protocol::TestPhase;

/// Figures gathered by a run. A field stays `None` until its phase succeeds,
/// so "not measured" is never confused with a measured zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TestResults {
    /// Minimum round-trip time in milliseconds.
    pub ping: Option<f64>,
    /// Mean absolute difference of consecutive round trips in milliseconds.
    pub jitter: Option<f64>,
    /// Download throughput in Mbit/s.
    pub download: Option<f64>,
    /// Upload throughput in Mbit/s.
    pub upload: Option<f64>,
}

impl TestResults {
    /// Whether no figure has been measured.
    pub fn is_empty(&self) -> bool {
        *self == TestResults::default()
    }
}

/// Read model published by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Active phase.
    pub phase: TestPhase,
    /// Latest instantaneous throughput of the active phase, in Mbit/s.
    pub speed_mbps: f64,
    /// Progress of the active phase, `0..=100`.
    pub progress: f64,
    /// Results gathered so far.
    pub results: TestResults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_serialize_as_null() {
        let results = TestResults {
            ping: Some(12.5),
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::to_value(results).unwrap();
        assert_eq!(json["ping"], 12.5);
        assert!(json["download"].is_null());
    }

    #[test]
    fn default_snapshot_is_idle_and_empty() {
        let s = Snapshot::default();
        assert_eq!(s.phase, TestPhase::Idle);
        assert!(s.results.is_empty());
        assert_eq!(s.progress, 0.0);
    }
}
