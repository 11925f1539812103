//! In-memory transport for timing tests under tokio's paused clock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use reqwest::StatusCode;
use tokio::time::sleep;

use crate::error::{NetgaugeError, Result};
use crate::transport::{ByteStream, Transport};

/// Scripted transport. Every field has a neutral default so tests only set
/// what they exercise.
pub(crate) struct MockTransport {
    /// Simulated round-trip times, consumed one per ping. An empty queue fails the probe.
    pub latencies: Mutex<VecDeque<u64>>,
    /// Size of each download chunk.
    pub chunk_size: usize,
    /// Delay before the first chunk of a stream.
    pub first_chunk_after: Duration,
    /// Delay between later chunks.
    pub chunk_every: Duration,
    /// Chunks per stream before it ends; `None` streams forever.
    pub chunks_per_stream: Option<usize>,
    /// Time an upload takes to be acknowledged.
    pub upload_latency: Duration,
    /// Fail every download and upload request.
    pub fail_transfers: bool,
    /// Panic inside `ping` instead of answering.
    pub panic_on_ping: bool,
    /// Panic inside `upload` instead of answering.
    pub panic_on_upload: bool,
    /// Number of download and upload requests issued.
    pub requests: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        MockTransport {
            latencies: Mutex::new(VecDeque::new()),
            chunk_size: 125_000,
            first_chunk_after: Duration::from_millis(50),
            chunk_every: Duration::from_millis(100),
            chunks_per_stream: None,
            upload_latency: Duration::from_millis(240),
            fail_transfers: false,
            panic_on_ping: false,
            panic_on_upload: false,
            requests: AtomicUsize::new(0),
        }
    }
}

impl MockTransport {
    pub fn with_latencies(latencies: &[u64]) -> Self {
        MockTransport {
            latencies: Mutex::new(latencies.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        MockTransport {
            fail_transfers: true,
            ..Default::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn unavailable() -> NetgaugeError {
        NetgaugeError::Status(StatusCode::SERVICE_UNAVAILABLE)
    }
}

impl Transport for MockTransport {
    async fn ping(&self) -> Result<()> {
        if self.panic_on_ping {
            panic!("scripted ping panic");
        }
        let next = self.latencies.lock().unwrap().pop_front();
        match next {
            Some(ms) => {
                sleep(Duration::from_millis(ms)).await;
                Ok(())
            }
            None => Err(Self::unavailable()),
        }
    }

    async fn download(&self) -> Result<ByteStream> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_transfers {
            return Err(Self::unavailable());
        }

        let chunk = Bytes::from(vec![0u8; self.chunk_size]);
        let first = self.first_chunk_after;
        let every = self.chunk_every;
        let limit = self.chunks_per_stream;
        let s = stream::unfold(0usize, move |n| {
            let chunk = chunk.clone();
            async move {
                if limit.is_some_and(|l| n >= l) {
                    return None;
                }
                sleep(if n == 0 { first } else { every }).await;
                Some((Ok(chunk), n + 1))
            }
        });
        Ok(Box::pin(s))
    }

    async fn upload(&self, payload: Bytes) -> Result<u64> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_upload {
            panic!("scripted upload panic");
        }
        if self.fail_transfers {
            return Err(Self::unavailable());
        }
        sleep(self.upload_latency).await;
        Ok(payload.len() as u64)
    }
}
