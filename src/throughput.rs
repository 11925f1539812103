//! Fixed-duration, multi-worker throughput phases.
//!
//! A phase opens a [`ThroughputWindow`], spawns its workers, and then samples
//! the shared byte counter on its own timer until the deadline passes or the
//! run is cancelled. The final figure uses the time elapsed up to that
//! instant, not the time at which the last worker happens to exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{NetgaugeError, Result};
use crate::params;
use crate::protocol::Direction;
use crate::source::random_block;
use crate::stats::{progress_percent, throughput_mbps};
use crate::transport::Transport;
use crate::{download, upload};

/// Measurement window shared by every worker of one phase.
#[derive(Debug)]
pub struct ThroughputWindow {
    start: Instant,
    duration: Duration,
    bytes: AtomicU64,
}

impl ThroughputWindow {
    /// Open a window starting now.
    pub fn open(duration: Duration) -> Self {
        ThroughputWindow {
            start: Instant::now(),
            duration,
            bytes: AtomicU64::new(0),
        }
    }

    /// Add `n` transferred bytes.
    pub fn record(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }

    /// Bytes transferred so far.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Time since the window opened.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Instant at which the window closes.
    pub fn deadline(&self) -> Instant {
        self.start + self.duration
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline()
    }

    /// Live reading, or `None` during the warm-up period.
    pub fn sample(&self) -> Option<Sample> {
        let elapsed = self.elapsed();
        if elapsed < params::WARMUP {
            return None;
        }
        Some(Sample {
            mbps: throughput_mbps(self.bytes(), elapsed),
            progress: progress_percent(elapsed, self.duration),
        })
    }
}

/// Instantaneous throughput reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Average rate since the phase started.
    pub mbps: f64,
    /// Share of the phase duration elapsed, `0..=100`.
    pub progress: f64,
}

/// Parameters of one throughput phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlan {
    /// Transfer direction.
    pub direction: Direction,
    /// Number of concurrent workers.
    pub concurrency: usize,
    /// Length of the measurement window.
    pub duration: Duration,
    /// Cadence of live samples.
    pub sample_interval: Duration,
    /// Size of each uploaded payload. Unused for downloads.
    pub payload_size: usize,
}

/// Result of a finished phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseOutcome {
    /// Transfer direction.
    pub direction: Direction,
    /// Final throughput.
    pub mbps: f64,
    /// Bytes counted up to the cancellation instant.
    pub bytes: u64,
    /// Time from phase start to the cancellation instant.
    pub elapsed: Duration,
    /// The run was cancelled before the deadline.
    pub interrupted: bool,
}

/// Run one throughput phase to its deadline.
///
/// `on_sample` is called from the phase's own timer, never from a worker.
/// Cancelling `token` ends the phase early; the outcome is then flagged
/// `interrupted`. Only a panicking worker turns into an error.
pub async fn run_phase<T, F>(
    transport: Arc<T>,
    plan: &PhasePlan,
    token: &CancellationToken,
    mut on_sample: F,
) -> Result<PhaseOutcome>
where
    T: Transport,
    F: FnMut(Sample),
{
    let payload = match plan.direction {
        Direction::Upload => random_block(plan.payload_size),
        Direction::Download => Bytes::new(),
    };

    let window = Arc::new(ThroughputWindow::open(plan.duration));
    let phase_token = token.child_token();
    let mut workers = JoinSet::new();

    for id in 0..plan.concurrency {
        let transport = Arc::clone(&transport);
        let window = Arc::clone(&window);
        let token = phase_token.clone();
        match plan.direction {
            Direction::Download => {
                workers.spawn(download::worker(id, transport, window, token));
            }
            Direction::Upload => {
                workers.spawn(upload::worker(id, transport, window, token, payload.clone()));
            }
        }
    }
    debug!(direction = ?plan.direction, workers = plan.concurrency, "phase started");

    let mut ticker = interval(plan.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = sleep_until(window.deadline());
    tokio::pin!(deadline);

    let interrupted = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break true,
            _ = &mut deadline => break false,
            _ = ticker.tick() => {
                if let Some(sample) = window.sample() {
                    on_sample(sample);
                }
            }
        }
    };

    phase_token.cancel();
    let elapsed = window.elapsed();
    let bytes = window.bytes();
    let mbps = throughput_mbps(bytes, elapsed);

    match timeout(params::WORKER_GRACE, join_all(&mut workers)).await {
        Ok(joined) => joined?,
        Err(_elapsed) => {
            debug!("aborting workers still in flight after grace period");
            workers.abort_all();
        }
    }

    let outcome = PhaseOutcome {
        direction: plan.direction,
        mbps,
        bytes,
        elapsed,
        interrupted,
    };
    if interrupted {
        warn!(direction = ?plan.direction, bytes, "phase interrupted");
    } else {
        info!(direction = ?plan.direction, mbps, bytes, "phase finished");
    }
    Ok(outcome)
}

/// Pause after a failed transfer, cut short by cancellation.
pub(crate) async fn backoff(token: &CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = sleep(params::RETRY_BACKOFF) => {}
    }
}

async fn join_all(workers: &mut JoinSet<()>) -> Result<()> {
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined
            && e.is_panic()
        {
            return Err(NetgaugeError::Join(e));
        }
    }
    Ok(())
}
