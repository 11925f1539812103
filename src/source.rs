//! Synthetic byte source for the download endpoint.
//!
//! A block of random bytes is filled once per stream and re-emitted by
//! reference. Emission goes through a bounded queue, so the producer is
//! suspended whenever the connection cannot take more data, and every stream
//! is closed after a hard wall-clock cap.

use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, stream};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

/// `size` pseudorandom bytes.
pub fn random_block(size: usize) -> Bytes {
    let mut rng = StdRng::from_os_rng();
    let mut buf = vec![0u8; size];
    rng.fill_bytes(&mut buf);
    Bytes::from(buf)
}

/// Start a producer and return the queue it fills, with the producer's
/// handle. The handle resolves to the number of bytes queued.
///
/// The producer stops when `cap` elapses or when the receiver is dropped.
/// At most `depth` blocks are ever queued.
pub fn spawn_source(
    block_size: usize,
    cap: Duration,
    depth: usize,
) -> (mpsc::Receiver<Bytes>, JoinHandle<u64>) {
    let block = random_block(block_size);
    let (tx, rx) = mpsc::channel(depth.max(1));

    let producer = tokio::spawn(async move {
        let mut sent: u64 = 0;
        let emit = async {
            while tx.send(block.clone()).await.is_ok() {
                sent += block.len() as u64;
            }
        };
        let closed = timeout(cap, emit).await.is_ok();
        if closed {
            debug!(bytes = sent, "byte source closed by peer");
        } else {
            debug!(bytes = sent, cap_secs = cap.as_secs_f64(), "byte source reached its cap");
        }
        sent
    });

    (rx, producer)
}

/// Body stream for one download response.
pub fn byte_stream(
    block_size: usize,
    cap: Duration,
    depth: usize,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let (rx, _producer) = spawn_source(block_size, cap, depth);
    stream::unfold(rx, |mut rx| async move {
        let block = rx.recv().await?;
        Some((Ok(block), rx))
    })
}
