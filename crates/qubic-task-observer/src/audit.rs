/*
[INPUT]:  Fetched audit logs and the previously accepted log for the same task
[OUTPUT]: Ordered, consistency-checked audit logs
[POS]:    Audit layer - correlates step history with external transaction references
[UPDATE]: When the audit append-only contract changes
*/

use std::sync::Arc;

use qubic_task_adapter::{AuditEntry, AuditLog, GatewayError, TaskApi};
use thiserror::Error;

/// A fetched log that contradicts the append-only contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditInconsistency {
    #[error("step {0} reported more than once")]
    DuplicateStep(u32),
    #[error("step {0} disappeared from the log")]
    MissingStep(u32),
    #[error("step {step_index} changed type from {before} to {after}")]
    StepRetyped {
        step_index: u32,
        before: String,
        after: String,
    },
    #[error("step {0} changed status after the task settled")]
    SettledStepChanged(u32),
}

#[derive(Debug, Error)]
pub enum AuditFetchError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("inconsistent audit log: {0}")]
    Inconsistent(#[from] AuditInconsistency),
}

/// Fetches audit logs and only hands out ones consistent with what was shown before.
#[derive(Clone)]
pub struct AuditCorrelator {
    api: Arc<dyn TaskApi>,
}

impl AuditCorrelator {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }

    /// Fetch and normalize the current log. A missing log means no step has been recorded yet.
    ///
    /// The result still has to pass [`reconcile`] against whatever is displayed when it lands.
    pub async fn fetch(&self, task_id: &str) -> Result<AuditLog, AuditFetchError> {
        let fetched = match self.api.get_audit_log(task_id).await {
            Ok(log) => log,
            Err(err) if err.is_not_found() => AuditLog::empty(task_id),
            Err(err) => return Err(err.into()),
        };
        Ok(normalize(fetched)?)
    }
}

/// Sort entries by `step_index`, reject duplicates, and fill `latest_txid` when omitted.
pub fn normalize(mut log: AuditLog) -> Result<AuditLog, AuditInconsistency> {
    log.logs.sort_by_key(|entry| entry.step_index);
    if let Some(pair) = log
        .logs
        .windows(2)
        .find(|pair| pair[0].step_index == pair[1].step_index)
    {
        return Err(AuditInconsistency::DuplicateStep(pair[0].step_index));
    }
    if log.latest_txid.is_none() {
        log.latest_txid = log
            .logs
            .iter()
            .rev()
            .find_map(|entry| entry.external_txid.clone());
    }
    Ok(log)
}

/// Accept `fetched` only if it extends `previous`.
///
/// Existing steps keep their index and type; their status may change until the task settles.
pub fn reconcile(
    previous: Option<&AuditLog>,
    fetched: AuditLog,
    settled: bool,
) -> Result<AuditLog, AuditInconsistency> {
    let fetched = normalize(fetched)?;
    let Some(previous) = previous else {
        return Ok(fetched);
    };

    for before in &previous.logs {
        let Some(after) = fetched.entry(before.step_index) else {
            return Err(AuditInconsistency::MissingStep(before.step_index));
        };
        if after.step_type != before.step_type {
            return Err(AuditInconsistency::StepRetyped {
                step_index: before.step_index,
                before: before.step_type.clone(),
                after: after.step_type.clone(),
            });
        }
        if settled && (after.status != before.status || after.external_txid != before.external_txid)
        {
            return Err(AuditInconsistency::SettledStepChanged(before.step_index));
        }
    }
    Ok(fetched)
}

/// Steps recorded after `step_index`, e.g. anything executed past a rejected approval.
pub fn steps_after(log: &AuditLog, step_index: u32) -> Vec<&AuditEntry> {
    log.logs
        .iter()
        .filter(|entry| entry.step_index > step_index)
        .collect()
}
