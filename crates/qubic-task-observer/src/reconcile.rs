/*
[INPUT]:  TaskApi, task_id, optional seed snapshot
[OUTPUT]: watch channel of ObservationView updated by sequenced refreshes
[POS]:    Observation layer - single refresh step shared by the poller and the approval gate
[UPDATE]: When refresh ordering or audit gating changes
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use qubic_task_adapter::{GatewayError, TaskApi, TaskSnapshot};
use tokio::sync::watch;

use crate::audit::{self, AuditCorrelator, AuditFetchError};
use crate::lifecycle::{Interpretation, Observation, interpret};
use crate::view::{ErrorSource, ObservationView, StatusApply};

/// What one refresh did to the view.
#[derive(Debug)]
pub enum RefreshOutcome {
    Applied {
        observation: Observation,
        interpretation: Interpretation,
    },
    /// A newer refresh already landed
    Stale,
    /// The fetched status regressed; the previous snapshot is kept
    Refused(Observation),
    /// Status fetch failed; recorded on the view
    Failed(GatewayError),
}

impl RefreshOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { interpretation, .. } if interpretation.terminal)
    }
}

/// Issues sequenced status/audit fetches for one task and applies only the newest results.
pub struct Reconciler {
    task_id: String,
    api: Arc<dyn TaskApi>,
    correlator: AuditCorrelator,
    view: watch::Sender<ObservationView>,
    issued: AtomicU64,
}

impl Reconciler {
    pub fn new(task_id: impl Into<String>, api: Arc<dyn TaskApi>) -> Self {
        let task_id = task_id.into();
        let (view, _) = watch::channel(ObservationView::new(task_id.clone()));
        Self {
            correlator: AuditCorrelator::new(api.clone()),
            task_id,
            api,
            view,
            issued: AtomicU64::new(0),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn subscribe(&self) -> watch::Receiver<ObservationView> {
        self.view.subscribe()
    }

    /// Current view
    pub fn view(&self) -> ObservationView {
        self.view.borrow().clone()
    }

    /// The task is terminal and the audit log fetched for that status was applied.
    pub fn is_settled(&self) -> bool {
        let view = self.view.borrow();
        view.is_terminal() && view.audit_settled
    }

    /// Apply a snapshot obtained outside the refresh loop, e.g. a creation acknowledgment.
    pub fn seed(&self, snapshot: TaskSnapshot) -> StatusApply {
        let seq = self.next_seq();
        self.apply_status(seq, snapshot)
    }

    /// Fetch status, then the audit log if steps may exist.
    ///
    /// Failures are recorded on the view; the next refresh retries.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.next_seq();

        let snapshot = match self.api.get_task_status(&self.task_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    task_id = %self.task_id,
                    seq,
                    error = %err,
                    "status fetch failed"
                );
                self.view
                    .send_modify(|view| view.record_error(ErrorSource::Status, err.to_string()));
                return RefreshOutcome::Failed(err);
            }
        };

        let interpretation = interpret(&snapshot);
        let observation = match self.apply_status(seq, snapshot) {
            StatusApply::Applied(observation) => observation,
            StatusApply::Stale => {
                tracing::debug!(task_id = %self.task_id, seq, "discarded stale status");
                return RefreshOutcome::Stale;
            }
            StatusApply::Refused(observation) => return RefreshOutcome::Refused(observation),
        };

        if interpretation.fetch_audit {
            self.refresh_audit(seq).await;
        }

        RefreshOutcome::Applied {
            observation,
            interpretation,
        }
    }

    /// Record a poll abandoned after `after` without an answer.
    pub fn record_timeout(&self, after: Duration) {
        tracing::warn!(
            task_id = %self.task_id,
            timeout_ms = after.as_millis() as u64,
            "status poll timed out"
        );
        self.view.send_modify(|view| {
            view.record_error(
                ErrorSource::Status,
                format!("no response within {}ms", after.as_millis()),
            )
        });
    }

    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply_status(&self, seq: u64, snapshot: TaskSnapshot) -> StatusApply {
        let mut outcome = StatusApply::Stale;
        self.view.send_if_modified(|view| {
            let status = snapshot.status.clone();
            outcome = view.apply_status(seq, snapshot);
            match &outcome {
                StatusApply::Stale => false,
                StatusApply::Refused(observation) => {
                    tracing::warn!(
                        task_id = %self.task_id,
                        seq,
                        observation = ?observation,
                        "ignored status that regresses the lifecycle"
                    );
                    view.record_error(
                        ErrorSource::Status,
                        format!("ignored regression to {status}"),
                    );
                    true
                }
                StatusApply::Applied(observation) => {
                    log_observation(&self.task_id, observation);
                    true
                }
            }
        });
        outcome
    }

    async fn refresh_audit(&self, seq: u64) {
        let fetched = match self.correlator.fetch(&self.task_id).await {
            Ok(log) => log,
            Err(err) => {
                self.record_audit_failure(seq, &err);
                return;
            }
        };

        self.view.send_if_modified(|view| {
            if seq < view.audit_seq {
                return false;
            }
            match audit::reconcile(view.audit.as_ref(), fetched, view.audit_settled) {
                Ok(log) => {
                    tracing::debug!(
                        task_id = %self.task_id,
                        seq,
                        steps = log.logs.len(),
                        latest_txid = ?log.latest_txid,
                        "audit log applied"
                    );
                    view.apply_audit(seq, log)
                }
                Err(inconsistency) => {
                    tracing::warn!(
                        task_id = %self.task_id,
                        seq,
                        error = %inconsistency,
                        "discarded inconsistent audit log"
                    );
                    view.record_error(
                        ErrorSource::Audit,
                        format!("inconsistent audit log: {inconsistency}"),
                    );
                    true
                }
            }
        });
    }

    fn record_audit_failure(&self, seq: u64, err: &AuditFetchError) {
        tracing::warn!(
            task_id = %self.task_id,
            seq,
            error = %err,
            "audit fetch failed"
        );
        self.view
            .send_modify(|view| view.record_error(ErrorSource::Audit, err.to_string()));
    }
}

fn log_observation(task_id: &str, observation: &Observation) {
    match observation {
        Observation::Initial(status) => {
            tracing::info!(task_id = %task_id, status = %status, "task status observed");
        }
        Observation::Unchanged(status) => {
            tracing::debug!(task_id = %task_id, status = %status, "task status unchanged");
        }
        Observation::Advanced { from, to } => {
            tracing::info!(task_id = %task_id, from = %from, to = %to, "task status advanced");
        }
        Observation::Leapt { from, to } => {
            tracing::info!(
                task_id = %task_id,
                from = %from,
                to = %to,
                "task status advanced past unobserved states"
            );
        }
        Observation::Unrecognized(raw) => {
            tracing::warn!(task_id = %task_id, status = %raw, "unrecognized task status");
        }
        Observation::Regressed { .. } => {}
    }
}
