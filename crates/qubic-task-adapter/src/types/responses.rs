/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed acknowledgments for mutating endpoints
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::{TaskStatus, TaskType};
use super::models::TaskSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub message: String,
}

impl CreateTaskResponse {
    /// First snapshot of a freshly created task, as acknowledged by the engine.
    pub fn into_snapshot(self, task_type: TaskType) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.task_id,
            task_type: Some(task_type),
            status: self.status,
            current_step: None,
            total_steps: None,
            requires_approval: false,
            plan_id: None,
            created_at: None,
            updated_at: None,
            message: Some(self.message).filter(|message| !message.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub task_id: String,
    pub approved: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
