//! Latency and throughput arithmetic.
//!
//! Everything here is pure: no I/O, no clocks, no shared state.

use std::time::Duration;

use serde::Serialize;

/// Minimum latency and jitter derived from one run's probes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyResult {
    /// Smallest round-trip time observed, in milliseconds.
    pub ping: f64,
    /// Mean absolute difference between consecutive samples, in milliseconds.
    pub jitter: f64,
}

/// Reduce an ordered set of round-trip samples (milliseconds).
///
/// The minimum is used rather than the mean so that probes inflated by
/// queueing do not count against the idle-link latency. Returns `None` for an
/// empty slice; a single sample has a jitter of zero.
pub fn latency_stats(samples: &[f64]) -> Option<LatencyResult> {
    let ping = samples.iter().copied().reduce(f64::min)?;

    let jitter = if samples.len() > 1 {
        let sum: f64 = samples.windows(2).map(|w| (w[0] - w[1]).abs()).sum();
        sum / (samples.len() - 1) as f64
    } else {
        0.0
    };

    Some(LatencyResult { ping, jitter })
}

/// Megabits per second for `bytes` transferred in `elapsed`.
///
/// A zero interval yields `0.0`.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 * 8.0 / (secs * 1_000_000.0)
}

/// Share of `duration` covered by `elapsed`, clamped to `0..=100`.
pub fn progress_percent(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 100.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0).min(100.0)
}
