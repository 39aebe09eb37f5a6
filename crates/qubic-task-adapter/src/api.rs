/*
[INPUT]:  Task lifecycle requests
[OUTPUT]: Object-safe async boundary over the remote engine
[POS]:    Boundary layer - seam between transport and observation runtime
[UPDATE]: When the engine contract gains or loses operations
*/

use async_trait::async_trait;

use crate::http::{GatewayClient, Result};
use crate::types::{
    AuditLog, CreateTaskRequest, CreateTaskResponse, Decision, DecisionResponse, TaskSnapshot,
};

/// Remote engine contract the observation runtime drives.
///
/// Implemented by [`GatewayClient`]; tests substitute scripted engines.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse>;

    /// Idempotent read of the current snapshot
    async fn get_task_status(&self, task_id: &str) -> Result<TaskSnapshot>;

    async fn submit_decision(&self, task_id: &str, decision: &Decision)
    -> Result<DecisionResponse>;

    /// Idempotent read of the step history
    async fn get_audit_log(&self, task_id: &str) -> Result<AuditLog>;
}

#[async_trait]
impl TaskApi for GatewayClient {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse> {
        GatewayClient::create_task(self, request).await
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskSnapshot> {
        GatewayClient::get_task_status(self, task_id).await
    }

    async fn submit_decision(
        &self,
        task_id: &str,
        decision: &Decision,
    ) -> Result<DecisionResponse> {
        GatewayClient::submit_decision(self, task_id, decision).await
    }

    async fn get_audit_log(&self, task_id: &str) -> Result<AuditLog> {
        GatewayClient::get_audit_log(self, task_id).await
    }
}
