//! Test run state machine.
//!
//! ```text
//! Idle/Completed --start--> Ping --> Download --> Upload --> Completed
//! ```
//!
//! Phases run strictly one after another in a single spawned task. The
//! current [`Snapshot`] is published on a `watch` channel so any number of
//! front ends can follow a run. Whatever happens inside a phase, the run ends
//! in `Completed` with the results gathered up to that point.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TestConfig;
use crate::error::{NetgaugeError, Result};
use crate::ping;
use crate::protocol::{Direction, TestPhase};
use crate::summary::{Snapshot, TestResults};
use crate::throughput::{self, PhaseOutcome};
use crate::transport::Transport;

/// Drives test runs against one transport.
pub struct Orchestrator<T: Transport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: Arc<T>,
    config: TestConfig,
    state: watch::Sender<Snapshot>,
    run_token: Mutex<CancellationToken>,
}

impl<T: Transport> Orchestrator<T> {
    /// Create an idle orchestrator. Fails if `config` does not validate.
    pub fn new(transport: T, config: TestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Orchestrator {
            inner: Arc::new(Inner {
                transport: Arc::new(transport),
                config,
                state: watch::Sender::new(Snapshot::default()),
                run_token: Mutex::new(CancellationToken::new()),
            }),
        })
    }

    /// Start a run if none is in progress.
    ///
    /// Returns `false` without touching any state when a run is already
    /// active. Otherwise results are cleared, the phase becomes
    /// [`TestPhase::Ping`] before this returns, and the run continues in the
    /// background. Must be called within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut current = self
            .inner
            .run_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let started = self.inner.state.send_if_modified(|s| {
            if !s.phase.is_at_rest() {
                return false;
            }
            *s = Snapshot {
                phase: TestPhase::Ping,
                ..Default::default()
            };
            true
        });
        if !started {
            debug!("start ignored, a run is in progress");
            return false;
        }

        *current = CancellationToken::new();
        let token = current.clone();
        drop(current);

        info!("test run started");
        tokio::spawn(Arc::clone(&self.inner).drive(token));
        true
    }

    /// Abort the active run. The interrupted phase leaves its figure absent
    /// and the run moves to [`TestPhase::Completed`]. Idempotent.
    pub fn cancel(&self) {
        self.inner
            .run_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Current state.
    pub fn snapshot(&self) -> Snapshot {
        *self.inner.state.borrow()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    /// Wait until the phase is [`TestPhase::Completed`] and return that state.
    pub async fn wait_completed(&self) -> Snapshot {
        let mut rx = self.subscribe();
        let done = rx.wait_for(|s| s.phase == TestPhase::Completed).await;
        match done {
            Ok(snapshot) => *snapshot,
            Err(_) => self.snapshot(),
        }
    }
}

impl<T: Transport> Inner<T> {
    async fn drive(self: Arc<Self>, token: CancellationToken) {
        // a separate task so that a panic in a phase is caught here
        let run = tokio::spawn(Arc::clone(&self).run_phases(token.clone()));
        match run.await {
            Ok(Ok(())) if token.is_cancelled() => warn!("test run cancelled"),
            Ok(Ok(())) => info!("test run completed"),
            Ok(Err(e)) => warn!(error = %e, "test run failed, keeping partial results"),
            Err(e) => error!(error = %e, "test run crashed, keeping partial results"),
        }
        token.cancel();

        self.state.send_modify(|s| {
            s.phase = TestPhase::Completed;
            s.speed_mbps = 0.0;
            s.progress = 100.0;
        });
        debug!(results = ?self.state.borrow().results, "test run finished");
    }

    async fn run_phases(self: Arc<Self>, token: CancellationToken) -> Result<()> {
        let config = &self.config;

        let latency = ping::measure(
            &*self.transport,
            config.ping_iterations,
            config.inter_probe_delay,
            &token,
        )
        .await;
        if token.is_cancelled() {
            return Ok(());
        }
        match latency {
            Ok(r) => {
                info!(ping_ms = r.ping, jitter_ms = r.jitter, "latency measured");
                self.update_results(|res| {
                    res.ping = Some(r.ping);
                    res.jitter = Some(r.jitter);
                });
            }
            Err(NetgaugeError::LatencyUnavailable) => warn!("latency unavailable"),
            Err(e) => return Err(e),
        }

        let Some(download) = self.throughput(Direction::Download, &token).await? else {
            return Ok(());
        };
        self.update_results(|res| res.download = Some(download.mbps));

        let Some(upload) = self.throughput(Direction::Upload, &token).await? else {
            return Ok(());
        };
        self.update_results(|res| res.upload = Some(upload.mbps));

        Ok(())
    }

    // `None` when the run was cancelled during the phase.
    async fn throughput(
        &self,
        direction: Direction,
        token: &CancellationToken,
    ) -> Result<Option<PhaseOutcome>> {
        self.enter(TestPhase::from(direction));
        if direction == Direction::Upload {
            // let the download connections drain first
            tokio::select! {
                _ = token.cancelled() => return Ok(None),
                _ = sleep(self.config.settling_delay) => {}
            }
        }

        let plan = self.config.plan(direction);
        let outcome = throughput::run_phase(Arc::clone(&self.transport), &plan, token, |sample| {
            self.state.send_modify(|s| {
                s.speed_mbps = sample.mbps;
                s.progress = sample.progress;
            });
        })
        .await?;

        if outcome.interrupted {
            Ok(None)
        } else {
            Ok(Some(outcome))
        }
    }

    fn enter(&self, phase: TestPhase) {
        debug!(?phase, "entering phase");
        self.state.send_modify(|s| {
            s.phase = phase;
            s.speed_mbps = 0.0;
            s.progress = 0.0;
        });
    }

    fn update_results(&self, f: impl FnOnce(&mut TestResults)) {
        self.state.send_modify(|s| f(&mut s.results));
    }
}
