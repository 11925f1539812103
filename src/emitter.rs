//! Output formatting for test runs.
//!
//! The [`Emitter`] trait defines callbacks for each stage of a test run.
//! Two implementations are provided:
//! - [`HumanReadableEmitter`]: live progress and a formatted summary on a terminal.
//! - [`JsonEmitter`]: one JSON object per line, suitable for machine consumption.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::protocol::TestPhase;
use crate::summary::{Snapshot, TestResults};

#[derive(Serialize)]
#[serde(tag = "type")]
enum Event<'a> {
    Starting { server: &'a str },
    Phase { phase: TestPhase },
    Progress { phase: TestPhase, speed_mbps: f64, progress: f64 },
    Summary { results: &'a TestResults },
}

/// Callbacks for test run lifecycle events.
pub trait Emitter {
    /// Called once before the run starts.
    fn on_starting(&mut self, server: &str) -> Result<()>;
    /// Called when the run enters a new phase.
    fn on_phase(&mut self, phase: TestPhase) -> Result<()>;
    /// Called for each live throughput reading.
    fn on_progress(&mut self, s: &Snapshot) -> Result<()>;
    /// Called after the run completes, with the final results.
    fn on_summary(&mut self, results: &TestResults) -> Result<()>;
}

/// Emits human-readable progress and results to a writer.
pub struct HumanReadableEmitter<W: Write> {
    out: W,
}

impl<W: Write> HumanReadableEmitter<W> {
    /// Create a new emitter writing to `out`.
    pub fn new(out: W) -> Self {
        HumanReadableEmitter { out }
    }
}

impl<W: Write> Emitter for HumanReadableEmitter<W> {
    fn on_starting(&mut self, server: &str) -> Result<()> {
        writeln!(self.out, "testing against {server}")?;
        Ok(())
    }

    fn on_phase(&mut self, phase: TestPhase) -> Result<()> {
        match phase {
            TestPhase::Idle => {}
            TestPhase::Completed => writeln!(self.out)?,
            _ => write!(self.out, "\n{:?} in progress", phase)?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn on_progress(&mut self, s: &Snapshot) -> Result<()> {
        write!(
            self.out,
            "\r{:>8}: {:>7.1} Mbit/s {:>5.0} %",
            format!("{:?}", s.phase),
            s.speed_mbps,
            s.progress
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn on_summary(&mut self, r: &TestResults) -> Result<()> {
        writeln!(self.out, "\nTest results\n")?;
        writeln!(self.out, "{:>10}: {}", "Ping", value(r.ping, "ms"))?;
        writeln!(self.out, "{:>10}: {}", "Jitter", value(r.jitter, "ms"))?;
        writeln!(self.out, "{:>10}: {}", "Download", value(r.download, "Mbit/s"))?;
        writeln!(self.out, "{:>10}: {}", "Upload", value(r.upload, "Mbit/s"))?;
        Ok(())
    }
}

fn value(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(v) => format!("{v:>7.1} {unit}"),
        None => format!("{:>7}", "n/a"),
    }
}

/// Emits one JSON object per line for each event.
pub struct JsonEmitter<W: Write> {
    out: W,
}

impl<W: Write> JsonEmitter<W> {
    /// Create a new JSON emitter writing to `out`.
    pub fn new(out: W) -> Self {
        JsonEmitter { out }
    }

    fn emit(&mut self, event: &Event) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.out, "{}", json)?;
        Ok(())
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn on_starting(&mut self, server: &str) -> Result<()> {
        self.emit(&Event::Starting { server })
    }

    fn on_phase(&mut self, phase: TestPhase) -> Result<()> {
        self.emit(&Event::Phase { phase })
    }

    fn on_progress(&mut self, s: &Snapshot) -> Result<()> {
        self.emit(&Event::Progress {
            phase: s.phase,
            speed_mbps: s.speed_mbps,
            progress: s.progress,
        })
    }

    fn on_summary(&mut self, results: &TestResults) -> Result<()> {
        self.emit(&Event::Summary { results })
    }
}
