use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use netgauge::config::ServerConfig;
use netgauge::params;
use netgauge::server;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
    /// Size of the repeated random block, in KiB
    #[arg(long, default_value_t = params::SOURCE_BLOCK_SIZE / 1024)]
    block_kib: usize,
    /// Hard cap on one download stream, in seconds
    #[arg(long, default_value_t = params::SOURCE_STREAM_CAP.as_secs())]
    stream_cap_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        block_size: cli.block_kib * 1024,
        stream_cap: Duration::from_secs(cli.stream_cap_secs),
        ..Default::default()
    };

    let listener = TcpListener::bind(cli.listen).await?;
    server::serve(listener, config).await?;

    Ok(())
}
