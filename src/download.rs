//! Download worker.
//!
//! Reads streams from the byte source back to back, adding every chunk to
//! the phase counter, until the phase token is cancelled.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::throughput::{ThroughputWindow, backoff};
use crate::transport::Transport;

/// Run one download worker until `token` is cancelled or the window expires.
///
/// A failed request or a broken stream only ends that stream; the worker
/// opens a new one if time remains. Bytes already counted stay counted.
pub async fn worker<T: Transport>(
    id: usize,
    transport: Arc<T>,
    window: Arc<ThroughputWindow>,
    token: CancellationToken,
) {
    let mut streams = 0usize;

    while !token.is_cancelled() && !window.is_expired() {
        let opened = tokio::select! {
            _ = token.cancelled() => break,
            r = transport.download() => r,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                debug!(worker = id, error = %e, "download request failed");
                backoff(&token).await;
                continue;
            }
        };
        streams += 1;

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => return,
                chunk = stream.next() => chunk,
            };
            match next {
                Some(Ok(chunk)) => window.record(chunk.len() as u64),
                Some(Err(e)) => {
                    debug!(worker = id, error = %e, "download stream broke");
                    break;
                }
                None => {
                    trace!(worker = id, "download stream ended");
                    break;
                }
            }
        }
    }

    trace!(worker = id, streams, "download worker stopped");
}
