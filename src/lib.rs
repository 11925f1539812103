//! An HTTP speed test engine.
//!
//! netgauge measures round-trip latency, jitter, download and upload
//! throughput between a client and a netgauge server. A run probes the ping
//! endpoint sequentially, then saturates the link with concurrent streaming
//! downloads and concurrent fixed-size uploads for fixed wall-clock windows,
//! reporting live throughput along the way.
//!
//! # Quick start
//!
//! ```no_run
//! use netgauge::client::Client;
//! use netgauge::config::TestConfig;
//! use netgauge::orchestrator::Orchestrator;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("http://127.0.0.1:8080")?;
//! let orchestrator = Orchestrator::new(client, TestConfig::default())?;
//!
//! orchestrator.start();
//! let done = orchestrator.wait_completed().await;
//! println!("{:?}", done.results);
//! # Ok(())
//! # }
//! ```
//!
//! The server side lives in [`server`]; `netgauge-server` hosts it.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub(crate) mod download;
pub mod emitter;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod ping;
pub mod protocol;
pub mod server;
pub mod source;
pub mod stats;
pub mod summary;
pub mod throughput;
pub mod transport;
pub(crate) mod upload;

#[cfg(test)]
pub(crate) mod testutil;
