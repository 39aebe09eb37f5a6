/*
[INPUT]:  Reconciler, PollingConfig, CancellationToken
[OUTPUT]: Background tokio task refreshing one observed task at a fixed cadence
[POS]:    Observation layer - status poller lifecycle
[UPDATE]: When changing poll cadence, timeout, or stop conditions
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PollingConfig;
use crate::reconcile::Reconciler;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a poll loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    Cancelled,
    /// A terminal status and its audit log were applied and `stop_on_terminal` is set
    Terminal,
}

/// Handle to a running poll loop.
pub struct StatusPoller {
    task_id: String,
    shutdown: CancellationToken,
    handle: JoinHandle<PollerExit>,
}

impl StatusPoller {
    /// Spawn the loop. The first refresh runs immediately.
    pub fn spawn(
        reconciler: Arc<Reconciler>,
        config: &PollingConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let task_id = reconciler.task_id().to_string();
        let handle = tokio::spawn(run(
            reconciler,
            config.interval(),
            config.stop_on_terminal,
            shutdown.clone(),
        ));
        Self {
            task_id,
            shutdown,
            handle,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to exit on its own, e.g. after a terminal status.
    pub async fn join(self) -> Result<PollerExit> {
        let task_id = self.task_id;
        self.handle
            .await
            .map_err(|err| anyhow!("poller join error task_id={task_id}: {err}"))
    }

    /// Cancel and wait; aborts the loop if it does not exit in time.
    ///
    /// No refresh is issued after this returns.
    pub async fn stop(self) -> Result<PollerExit> {
        self.shutdown.cancel();

        let mut handle = self.handle;
        let deadline = Instant::now() + STOP_TIMEOUT;

        tokio::select! {
            res = &mut handle => {
                res.map_err(|err| anyhow!("poller join error task_id={}: {err}", self.task_id))
            }
            _ = tokio::time::sleep_until(deadline) => {
                handle.abort();
                Err(anyhow!("poller stop timed out after {STOP_TIMEOUT:?} task_id={}", self.task_id))
            }
        }
    }
}

async fn run(
    reconciler: Arc<Reconciler>,
    interval: Duration,
    stop_on_terminal: bool,
    shutdown: CancellationToken,
) -> PollerExit {
    let task_id = reconciler.task_id().to_string();
    tracing::info!(
        task_id = %task_id,
        interval_ms = interval.as_millis() as u64,
        "status poller started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let exit = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break PollerExit::Cancelled,
            _ = ticker.tick() => {}
        }

        // A poll that outlives its interval is abandoned; the next tick issues a fresh one.
        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break PollerExit::Cancelled,
            res = tokio::time::timeout(interval, reconciler.refresh()) => res,
        };

        match outcome {
            Ok(outcome) if stop_on_terminal && outcome.is_terminal() => {
                // The final audit log must land before the loop may stop.
                if reconciler.is_settled() {
                    break PollerExit::Terminal;
                }
                tracing::debug!(task_id = %task_id, "terminal status applied, audit log pending");
            }
            Ok(_) => {}
            Err(_elapsed) => reconciler.record_timeout(interval),
        }
    };

    tracing::info!(task_id = %task_id, exit = ?exit, "status poller stopped");
    exit
}
