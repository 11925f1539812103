use std::time::Duration;

use clap::Parser;
use netgauge::client::Client;
use netgauge::config::{PhaseConfig, TestConfig};
use netgauge::emitter::{Emitter, HumanReadableEmitter, JsonEmitter};
use netgauge::orchestrator::Orchestrator;
use netgauge::params;
use netgauge::protocol::TestPhase;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, clap::ValueEnum)]
enum Format {
    Human,
    Json,
}

#[derive(Parser, Debug)]
struct Cli {
    /// Base URL of the netgauge server
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,
    /// Output format to use: 'human' or 'json' for batch processing
    #[arg(long, default_value = "human")]
    format: Format,
    /// Emit phase changes and the summary only
    #[arg(long)]
    quiet: bool,
    /// Number of latency probes
    #[arg(long, default_value_t = params::PING_ITERATIONS)]
    ping_count: usize,
    /// Pause between latency probes, in milliseconds
    #[arg(long, default_value_t = params::INTER_PROBE_DELAY.as_millis() as u64)]
    ping_delay_ms: u64,
    /// Length of the download window, in seconds
    #[arg(long, default_value_t = params::DOWNLOAD_DURATION.as_secs_f64())]
    download_secs: f64,
    /// Concurrent download streams
    #[arg(long, default_value_t = params::DOWNLOAD_CONCURRENCY)]
    download_streams: usize,
    /// Length of the upload window, in seconds
    #[arg(long, default_value_t = params::UPLOAD_DURATION.as_secs_f64())]
    upload_secs: f64,
    /// Concurrent upload workers
    #[arg(long, default_value_t = params::UPLOAD_CONCURRENCY)]
    upload_streams: usize,
    /// Size of each uploaded payload, in KiB
    #[arg(long, default_value_t = params::UPLOAD_PAYLOAD_SIZE / 1024)]
    upload_kib: usize,
    /// Pause before the upload phase, in milliseconds
    #[arg(long, default_value_t = params::SETTLING_DELAY.as_millis() as u64)]
    settle_ms: u64,
}

impl Cli {
    fn test_config(&self) -> Result<TestConfig, Box<dyn std::error::Error>> {
        Ok(TestConfig {
            ping_iterations: self.ping_count,
            inter_probe_delay: Duration::from_millis(self.ping_delay_ms),
            download: PhaseConfig {
                duration: Duration::try_from_secs_f64(self.download_secs)?,
                concurrency: self.download_streams,
            },
            upload: PhaseConfig {
                duration: Duration::try_from_secs_f64(self.upload_secs)?,
                concurrency: self.upload_streams,
            },
            upload_payload_size: self.upload_kib * 1024,
            settling_delay: Duration::from_millis(self.settle_ms),
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut emitter: Box<dyn Emitter> = match cli.format {
        Format::Human => Box::new(HumanReadableEmitter::new(std::io::stdout())),
        Format::Json => Box::new(JsonEmitter::new(std::io::stdout())),
    };

    let client = Client::new(&cli.server)?;
    let server = client.server().to_string();
    let orchestrator = Orchestrator::new(client, cli.test_config()?)?;

    emitter.on_starting(&server)?;

    let mut rx = orchestrator.subscribe();
    orchestrator.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut aborted = false;
    let mut last_phase = TestPhase::Idle;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut ctrl_c, if !aborted => {
                aborted = true;
                orchestrator.cancel();
                continue;
            }
        }

        let s = *rx.borrow_and_update();
        if s.phase != last_phase {
            last_phase = s.phase;
            emitter.on_phase(s.phase)?;
        } else if !cli.quiet
            && matches!(s.phase, TestPhase::Download | TestPhase::Upload)
            && s.progress > 0.0
        {
            emitter.on_progress(&s)?;
        }

        if s.phase == TestPhase::Completed {
            emitter.on_summary(&s.results)?;
            break;
        }
    }

    Ok(())
}
