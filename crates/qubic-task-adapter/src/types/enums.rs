/*
[INPUT]:  Gateway status strings and task kinds
[OUTPUT]: Closed task/step enums with a verbatim fallback for unrecognized values
[POS]:    Data layer - lifecycle vocabulary shared by client and observer
[UPDATE]: When the engine adds task kinds or lifecycle states
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of remote work, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    MonitorWallet,
    TransferFunds,
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::MonitorWallet => "monitor_wallet",
            TaskType::TransferFunds => "transfer_funds",
            TaskType::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "monitor_wallet" => TaskType::MonitorWallet,
            "transfer_funds" => TaskType::TransferFunds,
            _ => TaskType::Other(raw),
        }
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a task as reported by the engine.
///
/// Transitions (driven by the engine, only observed by clients):
/// - Pending -> Executing | Failed
/// - Executing -> WaitingApproval | Completed | Failed
/// - WaitingApproval -> Approved | Rejected | Executing | Completed | Failed
/// - Approved -> Executing | Completed | Failed
/// - Rejected -> Failed
///
/// `Unknown` carries any value outside this set verbatim. It is never terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Executing,
    WaitingApproval,
    Approved,
    Rejected,
    Completed,
    Failed,
    Unknown(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Executing => "executing",
            TaskStatus::WaitingApproval => "waiting_approval",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Rejected
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TaskStatus::Unknown(_))
    }

    pub fn awaits_decision(&self) -> bool {
        matches!(self, TaskStatus::WaitingApproval)
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => TaskStatus::Pending,
            "executing" => TaskStatus::Executing,
            "waiting_approval" => TaskStatus::WaitingApproval,
            "approved" => TaskStatus::Approved,
            "rejected" => TaskStatus::Rejected,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Unknown(raw),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        TaskStatus::from(raw.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single recorded step, independent of the parent task status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepStatus {
    Success,
    Failed,
    Other(String),
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for StepStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "success" => StepStatus::Success,
            "failed" => StepStatus::Failed,
            _ => StepStatus::Other(raw),
        }
    }
}

impl From<StepStatus> for String {
    fn from(value: StepStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
