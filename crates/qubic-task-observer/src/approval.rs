/*
[INPUT]:  Reconciler of one observed task, user decisions
[OUTPUT]: At most one submitted decision per approval episode, followed by a refresh
[POS]:    Approval layer - human-in-the-loop gate
[UPDATE]: When decision preconditions or post-decision behavior change
*/

use std::sync::Arc;

use qubic_task_adapter::{Decision, DecisionResponse, GatewayError, TaskApi, TaskStatus};
use tokio::sync::Mutex;

use crate::reconcile::{Reconciler, RefreshOutcome};

pub const DEFAULT_APPROVE_REASON: &str = "Approved by user";
pub const DEFAULT_REJECT_REASON: &str = "Rejected by user";

/// Result of a submitted decision.
#[derive(Debug)]
pub struct DecisionReceipt {
    pub response: DecisionResponse,
    /// Refresh issued right after submission
    pub refresh: RefreshOutcome,
}

/// Serializes decisions for one task and forbids a second one in the same episode.
pub struct ApprovalGate {
    api: Arc<dyn TaskApi>,
    reconciler: Arc<Reconciler>,
    /// Approval episode a decision was accepted for
    decided_episode: Mutex<Option<u64>>,
}

impl ApprovalGate {
    pub fn new(api: Arc<dyn TaskApi>, reconciler: Arc<Reconciler>) -> Self {
        Self {
            api,
            reconciler,
            decided_episode: Mutex::new(None),
        }
    }

    /// Whether approve/reject controls should be offered for the current view.
    pub async fn is_enabled(&self) -> bool {
        let view = self.reconciler.view();
        let enabled = view
            .interpretation()
            .is_some_and(|interpretation| interpretation.approval_enabled);
        enabled && *self.decided_episode.lock().await != Some(view.approval_episode)
    }

    pub async fn approve(&self, reason: Option<&str>) -> Result<DecisionReceipt, GatewayError> {
        self.decide(true, reason.unwrap_or(DEFAULT_APPROVE_REASON))
            .await
    }

    pub async fn reject(&self, reason: Option<&str>) -> Result<DecisionReceipt, GatewayError> {
        self.decide(false, reason.unwrap_or(DEFAULT_REJECT_REASON))
            .await
    }

    /// Submit a decision if the displayed task awaits one.
    ///
    /// Concurrent calls are serialized; once a decision is accepted, later ones fail with
    /// `InvalidState` until a fresh observation shows a new approval episode.
    pub async fn decide(
        &self,
        approved: bool,
        reason: &str,
    ) -> Result<DecisionReceipt, GatewayError> {
        let decision = Decision::new(approved, reason)?;
        let action = decision.action();
        let task_id = self.reconciler.task_id().to_string();

        let mut decided_episode = self.decided_episode.lock().await;

        let view = self.reconciler.view();
        let status = view.status().cloned();
        if status != Some(TaskStatus::WaitingApproval) {
            return Err(GatewayError::invalid_state(task_id, status, action));
        }
        if *decided_episode == Some(view.approval_episode) {
            tracing::warn!(
                task_id = %task_id,
                approval_episode = view.approval_episode,
                "decision already submitted for this approval"
            );
            return Err(GatewayError::invalid_state(task_id, status, action));
        }

        tracing::info!(
            task_id = %task_id,
            approved,
            reason = %decision.reason,
            idempotency_key = %decision.idempotency_key,
            "submitting decision"
        );
        let response = match self.api.submit_decision(&task_id, &decision).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    task_id = %task_id,
                    approved,
                    error = %err,
                    "decision submission failed"
                );
                return Err(err);
            }
        };
        *decided_episode = Some(view.approval_episode);
        drop(decided_episode);

        let refresh = self.reconciler.refresh().await;
        tracing::info!(
            task_id = %task_id,
            approved,
            status = ?self.reconciler.view().status(),
            "decision accepted"
        );

        Ok(DecisionReceipt { response, refresh })
    }
}
