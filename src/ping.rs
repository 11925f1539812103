//! Sequential latency probing.
//!
//! Probes run one after another with a short pause in between; concurrent
//! probes would measure request multiplexing rather than round-trip time.

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{NetgaugeError, Result};
use crate::params;
use crate::stats::{LatencyResult, latency_stats};
use crate::transport::Transport;

/// Issue `iterations` probes and return the round-trip times in milliseconds.
///
/// A failed or timed-out probe is skipped. Returns
/// [`NetgaugeError::LatencyUnavailable`] when no probe succeeded. Cancelling
/// `token` stops probing and returns what was collected so far.
pub async fn probe<T: Transport>(
    transport: &T,
    iterations: usize,
    inter_probe_delay: Duration,
    token: &CancellationToken,
) -> Result<Vec<f64>> {
    let mut samples = Vec::with_capacity(iterations);

    for i in 0..iterations {
        if token.is_cancelled() {
            break;
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            _ = token.cancelled() => break,
            r = timeout(params::IO_TIMEOUT, transport.ping()) => r,
        };
        match outcome {
            Ok(Ok(())) => {
                let rtt = start.elapsed().as_secs_f64() * 1000.0;
                trace!(iteration = i, rtt_ms = rtt, "ping probe");
                samples.push(rtt);
            }
            Ok(Err(e)) => debug!(iteration = i, error = %e, "ping probe failed"),
            Err(_elapsed) => {
                let e = NetgaugeError::Timeout(params::IO_TIMEOUT);
                debug!(iteration = i, error = %e, "ping probe failed");
            }
        }

        if i + 1 < iterations {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(inter_probe_delay) => {}
            }
        }
    }

    if samples.is_empty() {
        return Err(NetgaugeError::LatencyUnavailable);
    }
    Ok(samples)
}

/// Probe and reduce the samples to minimum latency and jitter.
pub async fn measure<T: Transport>(
    transport: &T,
    iterations: usize,
    inter_probe_delay: Duration,
    token: &CancellationToken,
) -> Result<LatencyResult> {
    let samples = probe(transport, iterations, inter_probe_delay, token).await?;
    latency_stats(&samples).ok_or(NetgaugeError::LatencyUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockTransport;

    const LATENCIES: [u64; 10] = [50, 55, 52, 48, 60, 51, 53, 49, 58, 50];

    fn expected_jitter() -> f64 {
        let diffs: u64 = LATENCIES.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
        diffs as f64 / 9.0
    }

    #[tokio::test(start_paused = true)]
    async fn collects_one_sample_per_probe() {
        let transport = MockTransport::with_latencies(&LATENCIES);
        let token = CancellationToken::new();

        let samples = probe(&transport, 10, params::INTER_PROBE_DELAY, &token)
            .await
            .unwrap();

        assert_eq!(samples.len(), 10);
        for (sample, expected) in samples.iter().zip(LATENCIES) {
            assert!((sample - expected as f64).abs() < 1.0, "{sample} vs {expected}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn measure_reports_min_and_jitter() {
        let transport = MockTransport::with_latencies(&LATENCIES);
        let token = CancellationToken::new();

        let r = measure(&transport, 10, params::INTER_PROBE_DELAY, &token)
            .await
            .unwrap();

        assert!((r.ping - 48.0).abs() < 1.0);
        assert!((r.jitter - expected_jitter()).abs() < 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probes_are_skipped() {
        // three scripted replies, the remaining seven probes fail
        let transport = MockTransport::with_latencies(&[20, 30, 25]);
        let token = CancellationToken::new();

        let samples = probe(&transport, 10, params::INTER_PROBE_DELAY, &token)
            .await
            .unwrap();

        assert_eq!(samples.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_replies_count_as_failures() {
        let slow = params::IO_TIMEOUT.as_millis() as u64 + 1_000;
        let transport = MockTransport::with_latencies(&[40, slow, 45]);
        let token = CancellationToken::new();

        let samples = probe(&transport, 3, params::INTER_PROBE_DELAY, &token)
            .await
            .unwrap();

        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|rtt| *rtt < 1_000.0), "{samples:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_mean_latency_unavailable() {
        let transport = MockTransport::default();
        let token = CancellationToken::new();

        let r = measure(&transport, 5, params::INTER_PROBE_DELAY, &token).await;

        assert!(matches!(r, Err(NetgaugeError::LatencyUnavailable)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_probing() {
        let transport = MockTransport::with_latencies(&LATENCIES);
        let token = CancellationToken::new();
        token.cancel();

        let r = probe(&transport, 10, params::INTER_PROBE_DELAY, &token).await;

        assert!(matches!(r, Err(NetgaugeError::LatencyUnavailable)));
        assert_eq!(transport.latencies.lock().unwrap().len(), 10);
    }
}
