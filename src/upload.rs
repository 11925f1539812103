//! Upload worker.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::throughput::{ThroughputWindow, backoff};
use crate::transport::Transport;

// Sends the same payload repeatedly; only acknowledged uploads are counted.
pub async fn worker<T: Transport>(
    id: usize,
    transport: Arc<T>,
    window: Arc<ThroughputWindow>,
    token: CancellationToken,
    payload: Bytes,
) {
    let size = payload.len() as u64;
    let mut sent = 0usize;

    while !token.is_cancelled() && !window.is_expired() {
        let result = tokio::select! {
            _ = token.cancelled() => break,
            r = transport.upload(payload.clone()) => r,
        };
        match result {
            Ok(received) => {
                if received != size {
                    debug!(worker = id, sent = size, received, "sink acknowledged a different size");
                }
                window.record(size);
                sent += 1;
            }
            Err(e) => {
                debug!(worker = id, error = %e, "upload request failed");
                backoff(&token).await;
            }
        }
    }

    trace!(worker = id, uploads = sent, "upload worker stopped");
}
