//! reqwest transport for a netgauge server.

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use url::Url;

use crate::error::{NetgaugeError, Result};
use crate::params;
use crate::protocol::{PingReply, UploadReceipt};
use crate::transport::{ByteStream, Transport};

/// HTTP transport talking to a netgauge server.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
}

impl Client {
    /// Create a client for the server rooted at `server_url`,
    /// e.g. "http://speed.example.net:8080".
    pub fn new(server_url: &str) -> Result<Self> {
        let base = Url::parse(server_url)?;
        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .build()?;
        Ok(Client { http, base })
    }

    /// Base URL of the server.
    pub fn server(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

impl Transport for Client {
    async fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(self.endpoint(params::PING_PATH)?)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .timeout(params::IO_TIMEOUT)
            .send()
            .await?;
        check_status(&response)?;

        // reading the body completes the round trip
        let _reply: PingReply = response.json().await?;
        Ok(())
    }

    async fn download(&self) -> Result<ByteStream> {
        let response = self
            .http
            .get(self.endpoint(params::DOWNLOAD_PATH)?)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        check_status(&response)?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(NetgaugeError::from));
        Ok(Box::pin(stream))
    }

    async fn upload(&self, payload: Bytes) -> Result<u64> {
        let response = self
            .http
            .post(self.endpoint(params::UPLOAD_PATH)?)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await?;
        check_status(&response)?;

        let receipt: UploadReceipt = response.json().await?;
        Ok(receipt.received)
    }
}

fn check_status(response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(NetgaugeError::Status(status))
    }
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
