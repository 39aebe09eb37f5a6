/*
[INPUT]:  Create requests, task ids, approval decisions
[OUTPUT]: Creation acknowledgments, status snapshots, decision acknowledgments
[POS]:    HTTP layer - task lifecycle endpoints
[UPDATE]: When task endpoints or their payloads change
*/

use reqwest::Method;

use crate::http::client::IDEMPOTENCY_HEADER;
use crate::http::{GatewayClient, GatewayError, Result};
use crate::types::{CreateTaskRequest, CreateTaskResponse, Decision, DecisionResponse, TaskSnapshot};

impl GatewayClient {
    /// Submit a new task
    ///
    /// POST /task/start
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreateTaskResponse> {
        let builder = self
            .request(Method::POST, &["task", "start"])?
            .header(IDEMPOTENCY_HEADER, &request.idempotency_key)
            .json(request);
        let response: CreateTaskResponse = self.send_json(builder, "task", "start").await?;
        tracing::info!(
            task_id = %response.task_id,
            task_type = %request.task_type,
            status = %response.status,
            "task created"
        );
        Ok(response)
    }

    /// Fetch the current status of a task
    ///
    /// GET /task/{task_id}
    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskSnapshot> {
        let builder = self.request(Method::GET, &["task", task_id])?;
        let snapshot: TaskSnapshot = self.send_json(builder, "task", task_id).await?;
        if snapshot.task_id != task_id {
            return Err(GatewayError::Api {
                code: 200,
                message: format!(
                    "status response for {} returned task_id {}",
                    task_id, snapshot.task_id
                ),
            });
        }
        Ok(snapshot)
    }

    /// Approve or reject a task waiting for a decision
    ///
    /// POST /task/{task_id}/approve
    pub async fn submit_decision(
        &self,
        task_id: &str,
        decision: &Decision,
    ) -> Result<DecisionResponse> {
        let builder = self
            .request(Method::POST, &["task", task_id, "approve"])?
            .header(IDEMPOTENCY_HEADER, &decision.idempotency_key)
            .json(decision);
        let response: DecisionResponse = match self.send_json(builder, "task", task_id).await {
            Ok(response) => response,
            // The engine refuses decisions for tasks not in waiting_approval.
            Err(GatewayError::Api { code: 400, .. }) => {
                return Err(GatewayError::invalid_state(task_id, None, decision.action()));
            }
            Err(GatewayError::ServiceUnavailable { message }) if is_relayed_refusal(&message) => {
                tracing::warn!(task_id = %task_id, detail = %message, "gateway relayed engine refusal");
                return Err(GatewayError::invalid_state(task_id, None, decision.action()));
            }
            Err(err) => return Err(err),
        };
        tracing::info!(
            task_id = %task_id,
            approved = decision.approved,
            "decision acknowledged"
        );
        Ok(response)
    }
}

/// The gateway reports an engine-side 400 as HTTP 500 with a
/// `Failed to process approval: Client error '400 Bad Request' ...` detail.
fn is_relayed_refusal(message: &str) -> bool {
    message.contains("Failed to process approval") && message.contains("'400 ")
}
