//! The seam between the measurement engine and the network.
//!
//! The prober and the throughput samplers only see this trait. [`Client`]
//! implements it over HTTP; tests substitute in-memory transports driven by
//! tokio's paused clock.
//!
//! [`Client`]: crate::client::Client

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::Result;

/// Incremental body of one download response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Access to the three speed test endpoints.
pub trait Transport: Send + Sync + 'static {
    /// Complete one uncached round trip to the ping endpoint.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    /// Open one streaming request to the byte source.
    fn download(&self) -> impl Future<Output = Result<ByteStream>> + Send;

    /// Send `payload` to the sink and return the byte count it acknowledged.
    fn upload(&self, payload: Bytes) -> impl Future<Output = Result<u64>> + Send;
}
