//! Run and server configuration.
//!
//! Defaults live in [`crate::params`]; these structs only group them and
//! reject values the engine cannot run with.

use std::time::Duration;

use crate::error::{NetgaugeError, Result};
use crate::params;
use crate::protocol::Direction;
use crate::throughput::PhasePlan;

/// Duration and worker count of one throughput phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseConfig {
    /// Length of the measurement window.
    pub duration: Duration,
    /// Number of concurrent workers.
    pub concurrency: usize,
}

/// Everything a test run can be tuned with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    /// Number of sequential latency probes.
    pub ping_iterations: usize,
    /// Pause between latency probes.
    pub inter_probe_delay: Duration,
    /// Download phase.
    pub download: PhaseConfig,
    /// Upload phase.
    pub upload: PhaseConfig,
    /// Size of each uploaded payload in bytes.
    pub upload_payload_size: usize,
    /// Pause between the download and upload phases.
    pub settling_delay: Duration,
    /// Cadence of live throughput samples.
    pub sample_interval: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        TestConfig {
            ping_iterations: params::PING_ITERATIONS,
            inter_probe_delay: params::INTER_PROBE_DELAY,
            download: PhaseConfig {
                duration: params::DOWNLOAD_DURATION,
                concurrency: params::DOWNLOAD_CONCURRENCY,
            },
            upload: PhaseConfig {
                duration: params::UPLOAD_DURATION,
                concurrency: params::UPLOAD_CONCURRENCY,
            },
            upload_payload_size: params::UPLOAD_PAYLOAD_SIZE,
            settling_delay: params::SETTLING_DELAY,
            sample_interval: params::SAMPLE_INTERVAL,
        }
    }
}

impl TestConfig {
    /// Check that every count and window is usable.
    pub fn validate(&self) -> Result<()> {
        if self.ping_iterations == 0 {
            return Err(invalid("ping iterations must be at least 1"));
        }
        for (name, phase) in [("download", &self.download), ("upload", &self.upload)] {
            if phase.concurrency == 0 {
                return Err(invalid(format!("{name} concurrency must be at least 1")));
            }
            if phase.duration.is_zero() {
                return Err(invalid(format!("{name} duration must be positive")));
            }
        }
        if self.upload_payload_size == 0 {
            return Err(invalid("upload payload size must be positive"));
        }
        if self.sample_interval.is_zero() {
            return Err(invalid("sample interval must be positive"));
        }
        Ok(())
    }

    /// Phase plan for `direction`.
    pub fn plan(&self, direction: Direction) -> PhasePlan {
        let phase = match direction {
            Direction::Download => self.download,
            Direction::Upload => self.upload,
        };
        PhasePlan {
            direction,
            concurrency: phase.concurrency,
            duration: phase.duration,
            sample_interval: self.sample_interval,
            payload_size: self.upload_payload_size,
        }
    }
}

/// Tuning of the byte source served by the download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Size of the repeated random block.
    pub block_size: usize,
    /// Lifetime cap of one download stream.
    pub stream_cap: Duration,
    /// Blocks queued ahead of the connection.
    pub queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            block_size: params::SOURCE_BLOCK_SIZE,
            stream_cap: params::SOURCE_STREAM_CAP,
            queue_depth: params::SOURCE_QUEUE_DEPTH,
        }
    }
}

impl ServerConfig {
    /// Check that the byte source can run.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(invalid("block size must be positive"));
        }
        if self.stream_cap.is_zero() {
            return Err(invalid("stream cap must be positive"));
        }
        if self.queue_depth == 0 {
            return Err(invalid("queue depth must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> NetgaugeError {
    NetgaugeError::InvalidConfig(msg.into())
}
