//! HTTP endpoints the engine measures against.
//!
//! - `GET  /api/speedtest/ping`: `{"time": <epoch ms>}`, never cached.
//! - `GET  /api/speedtest/download`: random bytes until the stream cap or disconnect.
//! - `POST /api/speedtest/upload`: discards the body, reports its size.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::params;
use crate::protocol::{PingReply, UploadReceipt, epoch_millis};
use crate::source;

/// Router serving the three endpoints.
pub fn router(config: ServerConfig) -> Router {
    Router::new()
        .route(params::PING_PATH, get(ping))
        .route(params::DOWNLOAD_PATH, get(download))
        .route(params::UPLOAD_PATH, post(upload))
        .layer(DefaultBodyLimit::disable())
        .with_state(Arc::new(config))
}

/// Serve on `listener` until the process exits.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<()> {
    config.validate()?;
    info!(addr = %listener.local_addr()?, "serving speed test endpoints");
    axum::serve(listener, router(config)).await?;
    Ok(())
}

async fn ping() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, params::PING_CACHE_CONTROL)],
        Json(PingReply {
            time: epoch_millis(),
        }),
    )
}

async fn download(State(config): State<Arc<ServerConfig>>) -> impl IntoResponse {
    let stream = source::byte_stream(config.block_size, config.stream_cap, config.queue_depth);
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, params::STREAM_CACHE_CONTROL),
        ],
        Body::from_stream(stream),
    )
}

async fn upload(body: Body) -> std::result::Result<Json<UploadReceipt>, StatusCode> {
    let mut stream = body.into_data_stream();
    let mut received: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            debug!(error = %e, received, "upload body broke");
            StatusCode::BAD_REQUEST
        })?;
        received += chunk.len() as u64;
    }

    Ok(Json(UploadReceipt {
        received,
        timestamp: epoch_millis(),
    }))
}
