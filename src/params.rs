//! Endpoint paths, defaults and tuning parameters.

use std::time::Duration;

/// Path of the latency probe endpoint.
pub const PING_PATH: &str = "/api/speedtest/ping";

/// Path of the streaming byte source.
pub const DOWNLOAD_PATH: &str = "/api/speedtest/download";

/// Path of the upload sink.
pub const UPLOAD_PATH: &str = "/api/speedtest/upload";

/// Number of sequential latency probes.
pub const PING_ITERATIONS: usize = 10;

/// Pause between two latency probes.
pub const INTER_PROBE_DELAY: Duration = Duration::from_millis(50);

/// Length of the download measurement window.
pub const DOWNLOAD_DURATION: Duration = Duration::from_secs(10);

/// Concurrent download streams.
pub const DOWNLOAD_CONCURRENCY: usize = 4;

/// Length of the upload measurement window.
pub const UPLOAD_DURATION: Duration = Duration::from_secs(5);

/// Concurrent upload workers.
pub const UPLOAD_CONCURRENCY: usize = 3;

/// Size of each uploaded payload (1 MiB).
pub const UPLOAD_PAYLOAD_SIZE: usize = 1 << 20;

/// Pause before the upload phase so download connections can drain.
pub const SETTLING_DELAY: Duration = Duration::from_secs(1);

/// Interval between live throughput samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// No live sample is reported before this much of a phase has elapsed.
pub const WARMUP: Duration = Duration::from_millis(500);

/// Time workers get to exit after a phase is cancelled before they are aborted.
pub const WORKER_GRACE: Duration = Duration::from_millis(500);

/// Pause after a failed transfer before a worker tries again.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Timeout for a single latency probe.
pub const IO_TIMEOUT: Duration = Duration::from_secs(7);

/// Size of the block the byte source repeats (1 MiB).
pub const SOURCE_BLOCK_SIZE: usize = 1 << 20;

/// Hard cap on the lifetime of one byte source stream.
pub const SOURCE_STREAM_CAP: Duration = Duration::from_secs(15);

/// Blocks the byte source may queue ahead of the connection.
pub const SOURCE_QUEUE_DEPTH: usize = 2;

/// `Cache-Control` value sent with ping replies.
pub const PING_CACHE_CONTROL: &str = "no-store, no-cache";

/// `Cache-Control` value sent with the byte stream.
pub const STREAM_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";
