/*
[INPUT]:  TaskApi, PollingConfig, create requests and task ids to observe
[OUTPUT]: Per-task observations (reconciler + poller + approval gate) with bounded shutdown
[POS]:    Session layer - owns every running observation
[UPDATE]: When changing begin/end/shutdown guarantees
*/

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use qubic_task_adapter::{
    CreateTaskRequest, GatewayError, TaskApi, TaskParameters, TaskSnapshot, TaskType,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::approval::{ApprovalGate, DecisionReceipt};
use crate::config::PollingConfig;
use crate::poller::{PollerExit, StatusPoller};
use crate::reconcile::{Reconciler, RefreshOutcome};
use crate::view::ObservationView;

/// Cloneable access to one observed task.
#[derive(Clone)]
pub struct ObservationHandle {
    reconciler: Arc<Reconciler>,
    gate: Arc<ApprovalGate>,
}

impl ObservationHandle {
    fn new(api: Arc<dyn TaskApi>, task_id: &str) -> Self {
        let reconciler = Arc::new(Reconciler::new(task_id, api.clone()));
        let gate = Arc::new(ApprovalGate::new(api, reconciler.clone()));
        Self { reconciler, gate }
    }

    pub fn task_id(&self) -> &str {
        self.reconciler.task_id()
    }

    pub fn subscribe(&self) -> watch::Receiver<ObservationView> {
        self.reconciler.subscribe()
    }

    pub fn view(&self) -> ObservationView {
        self.reconciler.view()
    }

    /// Out-of-band refresh, e.g. for a one-shot status query.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.reconciler.refresh().await
    }

    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    pub async fn decide(
        &self,
        approved: bool,
        reason: &str,
    ) -> Result<DecisionReceipt, GatewayError> {
        self.gate.decide(approved, reason).await
    }
}

struct ManagedObservation {
    handle: ObservationHandle,
    poller: StatusPoller,
}

/// Created task together with its live observation.
pub struct CreatedTask {
    /// Snapshot built from the creation acknowledgment
    pub snapshot: TaskSnapshot,
    pub handle: ObservationHandle,
}

/// Owns every observed task of the process.
pub struct TaskObserver {
    api: Arc<dyn TaskApi>,
    polling: PollingConfig,
    observations: HashMap<String, ManagedObservation>,
    shutdown: CancellationToken,
}

impl TaskObserver {
    pub fn new(api: Arc<dyn TaskApi>, polling: PollingConfig) -> Self {
        Self {
            api,
            polling,
            observations: HashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Root token; cancelling it stops every poller.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn observed_task_ids(&self) -> Vec<String> {
        self.observations.keys().cloned().collect()
    }

    pub fn handle(&self, task_id: &str) -> Option<ObservationHandle> {
        self.observations
            .get(task_id)
            .map(|observation| observation.handle.clone())
    }

    /// Whether the poller for `task_id` is still running.
    pub fn is_polling(&self, task_id: &str) -> bool {
        self.observations
            .get(task_id)
            .is_some_and(|observation| !observation.poller.is_finished())
    }

    /// Validate, submit, and begin observing the new task.
    ///
    /// Validation failures return before any request is sent and start no poller.
    pub async fn create_task(
        &mut self,
        task_type: TaskType,
        description: Option<String>,
        parameters: TaskParameters,
    ) -> Result<CreatedTask, GatewayError> {
        let request = CreateTaskRequest::new(task_type.clone(), description, parameters)?;
        let response = self.api.create_task(&request).await?;
        let snapshot = response.into_snapshot(task_type);

        let handle = self
            .start_observation(&snapshot.task_id, Some(snapshot.clone()))
            .await;
        Ok(CreatedTask { snapshot, handle })
    }

    /// Start polling `task_id`, replacing any existing observation of it.
    pub async fn begin_observation(&mut self, task_id: &str) -> ObservationHandle {
        self.start_observation(task_id, None).await
    }

    async fn start_observation(
        &mut self,
        task_id: &str,
        seed: Option<TaskSnapshot>,
    ) -> ObservationHandle {
        if let Err(err) = self.end_observation(task_id).await {
            tracing::warn!(task_id = %task_id, error = %err, "previous observation did not stop cleanly");
        }

        let handle = ObservationHandle::new(self.api.clone(), task_id);
        if let Some(snapshot) = seed {
            handle.reconciler.seed(snapshot);
        }
        let poller = StatusPoller::spawn(
            handle.reconciler.clone(),
            &self.polling,
            self.shutdown.child_token(),
        );
        tracing::info!(task_id = %task_id, "observation started");

        self.observations.insert(
            task_id.to_string(),
            ManagedObservation {
                handle: handle.clone(),
                poller,
            },
        );
        handle
    }

    /// Stop polling `task_id`. Ending an unobserved task is a no-op.
    pub async fn end_observation(&mut self, task_id: &str) -> Result<()> {
        let Some(observation) = self.observations.remove(task_id) else {
            return Ok(());
        };
        let exit = observation
            .poller
            .stop()
            .await
            .with_context(|| format!("end observation task_id={task_id}"))?;
        tracing::info!(task_id = %task_id, exit = ?exit, "observation ended");
        Ok(())
    }

    /// Wait until the poller for `task_id` exits on its own.
    pub async fn wait_for_completion(&mut self, task_id: &str) -> Result<PollerExit> {
        let observation = self
            .observations
            .remove(task_id)
            .ok_or_else(|| anyhow!("task_id not observed: {task_id}"))?;
        observation.poller.join().await
    }

    /// Cancel every observation and wait; each poller is aborted if it overruns its stop deadline.
    pub async fn shutdown_and_wait(&mut self) -> Result<()> {
        self.shutdown.cancel();

        let mut first_err = None;
        for (task_id, observation) in std::mem::take(&mut self.observations) {
            if let Err(err) = observation.poller.stop().await {
                tracing::warn!(task_id = %task_id, error = %err, "observation did not stop cleanly");
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err.context("shutdown observations")),
            None => Ok(()),
        }
    }
}
