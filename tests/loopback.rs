//! Runs the real server on a loopback port and measures against it.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use netgauge::client::Client;
use netgauge::config::{PhaseConfig, ServerConfig, TestConfig};
use netgauge::orchestrator::Orchestrator;
use netgauge::protocol::{PingReply, TestPhase, UploadReceipt};
use netgauge::server;
use netgauge::transport::Transport;
use tokio::net::TcpListener;
use tokio::time::timeout;

async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, config));
    addr
}

fn small_server() -> ServerConfig {
    ServerConfig {
        block_size: 64 * 1024,
        stream_cap: Duration::from_secs(2),
        queue_depth: 2,
    }
}

#[tokio::test]
async fn ping_endpoint_is_uncached_json() {
    let addr = spawn_server(small_server()).await;

    let response = reqwest::get(format!("http://{addr}/api/speedtest/ping"))
        .await
        .unwrap();

    assert!(response.status().is_success());
    let cache = response.headers()["cache-control"].to_str().unwrap().to_owned();
    assert!(cache.contains("no-store"));
    let reply: PingReply = response.json().await.unwrap();
    assert!(reply.time > 0);
}

#[tokio::test]
async fn upload_sink_reports_body_size() {
    let addr = spawn_server(small_server()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/speedtest/upload"))
        .body(vec![7u8; 300_000])
        .send()
        .await
        .unwrap();

    let receipt: UploadReceipt = response.json().await.unwrap();
    assert_eq!(receipt.received, 300_000);
    assert!(receipt.timestamp > 0);
}

#[tokio::test]
async fn download_stream_ends_at_cap() {
    let addr = spawn_server(ServerConfig {
        stream_cap: Duration::from_millis(300),
        ..small_server()
    })
    .await;
    let client = Client::new(&format!("http://{addr}")).unwrap();

    let mut stream = client.download().await.unwrap();
    let drained = timeout(Duration::from_secs(10), async {
        let mut total = 0u64;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len() as u64;
        }
        total
    })
    .await
    .expect("stream outlived its cap");

    assert!(drained > 0);
}

#[tokio::test]
async fn client_reaches_every_endpoint() {
    let addr = spawn_server(small_server()).await;
    let client = Client::new(&format!("http://{addr}")).unwrap();

    client.ping().await.unwrap();
    let received = client.upload(bytes::Bytes::from(vec![1u8; 4096])).await.unwrap();
    assert_eq!(received, 4096);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_run_over_loopback() {
    let addr = spawn_server(small_server()).await;
    let client = Client::new(&format!("http://{addr}")).unwrap();
    let config = TestConfig {
        ping_iterations: 3,
        download: PhaseConfig {
            duration: Duration::from_secs(1),
            concurrency: 2,
        },
        upload: PhaseConfig {
            duration: Duration::from_secs(1),
            concurrency: 2,
        },
        upload_payload_size: 64 * 1024,
        settling_delay: Duration::from_millis(100),
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(client, config).unwrap();

    assert!(orchestrator.start());
    let done = timeout(Duration::from_secs(30), orchestrator.wait_completed())
        .await
        .expect("run did not complete");

    assert_eq!(done.phase, TestPhase::Completed);
    let r = done.results;
    assert!(r.ping.unwrap() >= 0.0);
    assert!(r.jitter.unwrap() >= 0.0);
    assert!(r.download.unwrap() > 0.0);
    assert!(r.upload.unwrap() > 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_server_still_completes() {
    // bind then drop so nothing listens on the port
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = Client::new(&format!("http://{addr}")).unwrap();
    let config = TestConfig {
        ping_iterations: 2,
        download: PhaseConfig {
            duration: Duration::from_millis(600),
            concurrency: 2,
        },
        upload: PhaseConfig {
            duration: Duration::from_millis(600),
            concurrency: 1,
        },
        settling_delay: Duration::ZERO,
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(client, config).unwrap();

    assert!(orchestrator.start());
    let done = timeout(Duration::from_secs(30), orchestrator.wait_completed())
        .await
        .expect("run did not complete");

    assert!(done.results.ping.is_none());
    assert_eq!(done.results.download, Some(0.0));
    assert_eq!(done.results.upload, Some(0.0));
}
