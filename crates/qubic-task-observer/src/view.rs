/*
[INPUT]:  Sequenced status snapshots, audit logs, and recoverable fetch errors
[OUTPUT]: The displayed Task/AuditLog pair for one observed task
[POS]:    Shared view between the poller, the approval gate, and presentation
[UPDATE]: When adding/removing observation-level signals
*/

use chrono::{DateTime, Utc};
use qubic_task_adapter::{AuditLog, TaskSnapshot, TaskStatus};

use crate::lifecycle::{Interpretation, LifecycleTracker, Observation, interpret};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    Status,
    Audit,
}

/// Result of offering a status snapshot to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusApply {
    /// A newer snapshot is already displayed
    Stale,
    /// The status contradicts the lifecycle; the previous snapshot stays
    Refused(Observation),
    Applied(Observation),
}

/// A fetch failure absorbed by the observation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoverableError {
    pub source: ErrorSource,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationView {
    pub task_id: String,
    pub task: Option<TaskSnapshot>,
    pub audit: Option<AuditLog>,
    pub last_error: Option<RecoverableError>,
    /// Last recognized status, unaffected by unknown values
    pub lifecycle: LifecycleTracker,
    /// Issue sequence of the applied snapshot; older results are discarded
    pub status_seq: u64,
    pub audit_seq: u64,
    /// Whether the applied audit log was fetched after the task settled
    pub audit_settled: bool,
    /// Incremented each time the task enters a new approval episode
    pub approval_episode: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl ObservationView {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task: None,
            audit: None,
            last_error: None,
            lifecycle: LifecycleTracker::new(),
            status_seq: 0,
            audit_seq: 0,
            audit_settled: false,
            approval_episode: 0,
            last_refreshed_at: None,
        }
    }

    pub fn status(&self) -> Option<&TaskStatus> {
        self.task.as_ref().map(|task| &task.status)
    }

    pub fn interpretation(&self) -> Option<Interpretation> {
        self.task.as_ref().map(interpret)
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_some_and(TaskStatus::is_terminal)
    }

    /// Replace the snapshot wholesale if `seq` is newer than the applied one
    /// and its status does not regress the lifecycle.
    pub fn apply_status(&mut self, seq: u64, snapshot: TaskSnapshot) -> StatusApply {
        if seq <= self.status_seq {
            return StatusApply::Stale;
        }
        self.status_seq = seq;

        let observation = self.lifecycle.observe(&snapshot.status);
        if !observation.is_applicable() {
            return StatusApply::Refused(observation);
        }

        if snapshot.status.awaits_decision() {
            let same_episode = self.task.as_ref().is_some_and(|previous| {
                previous.status.awaits_decision() && previous.current_step == snapshot.current_step
            });
            if !same_episode {
                self.approval_episode += 1;
            }
        }

        self.task = Some(snapshot);
        self.last_refreshed_at = Some(Utc::now());
        if matches!(&self.last_error, Some(err) if err.source == ErrorSource::Status) {
            self.last_error = None;
        }
        StatusApply::Applied(observation)
    }

    /// Replace the audit log if `seq` is at least as new as the applied one.
    pub fn apply_audit(&mut self, seq: u64, log: AuditLog) -> bool {
        if seq < self.audit_seq {
            return false;
        }
        self.audit_seq = seq;
        self.audit_settled = self.is_terminal() && seq >= self.status_seq;
        self.audit = Some(log);
        if matches!(&self.last_error, Some(err) if err.source == ErrorSource::Audit) {
            self.last_error = None;
        }
        true
    }

    pub fn record_error(&mut self, source: ErrorSource, message: impl Into<String>) {
        self.last_error = Some(RecoverableError {
            source,
            message: message.into(),
            at: Utc::now(),
        });
    }
}
