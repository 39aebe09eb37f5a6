/*
[INPUT]:  Caller-supplied task parameters and approval decisions
[OUTPUT]: Validated request bodies with idempotency keys
[POS]:    Data layer - outbound payloads for mutating endpoints
[UPDATE]: When a task kind gains required parameters
*/

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::enums::TaskType;

/// Input rejected before any remote call was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Free-form task parameters with the fields the known task kinds require.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskParameters {
    pub fn wallet(address: impl Into<String>) -> Self {
        Self {
            wallet_address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn with_destination(mut self, address: impl Into<String>) -> Self {
        self.destination_address = Some(address.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Check the parameters required by `task_type`.
    pub fn validate_for(&self, task_type: &TaskType) -> Result<(), ValidationError> {
        match task_type {
            TaskType::MonitorWallet => {
                require_address("wallet_address", self.wallet_address.as_deref())?;
            }
            TaskType::TransferFunds => {
                let source = require_address("wallet_address", self.wallet_address.as_deref())?;
                let destination =
                    require_address("destination_address", self.destination_address.as_deref())?;
                if source == destination {
                    return Err(ValidationError::new(
                        "destination_address",
                        "must differ from the source wallet",
                    ));
                }
                match self.amount {
                    None => return Err(ValidationError::new("amount", "is required")),
                    Some(amount) if amount <= Decimal::ZERO => {
                        return Err(ValidationError::new("amount", "must be positive"));
                    }
                    Some(_) => {}
                }
            }
            TaskType::Other(_) => {}
        }
        Ok(())
    }
}

fn require_address<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(address) if !address.is_empty() => Ok(address),
        _ => Err(ValidationError::new(field, "is required")),
    }
}

/// Body of `POST /task/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub description: String,
    pub parameters: TaskParameters,
    pub idempotency_key: String,
}

impl CreateTaskRequest {
    /// Validate parameters and build the request body.
    ///
    /// A blank description falls back to a per-kind default.
    pub fn new(
        task_type: TaskType,
        description: Option<String>,
        parameters: TaskParameters,
    ) -> Result<Self, ValidationError> {
        parameters.validate_for(&task_type)?;

        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| default_description(&task_type).to_string());

        Ok(Self {
            wallet_address: parameters
                .wallet_address
                .as_ref()
                .map(|address| address.trim().to_string()),
            task_type,
            description,
            parameters,
            idempotency_key: Uuid::new_v4().to_string(),
        })
    }
}

fn default_description(task_type: &TaskType) -> &'static str {
    match task_type {
        TaskType::MonitorWallet => "Monitor wallet balance",
        TaskType::TransferFunds => "Transfer funds",
        TaskType::Other(_) => "Generic task",
    }
}

/// Approve/reject decision for a task in `waiting_approval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub approved: bool,
    pub reason: String,
    pub idempotency_key: String,
}

impl Decision {
    pub fn new(approved: bool, reason: impl Into<String>) -> Result<Self, ValidationError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(ValidationError::new("reason", "must not be blank"));
        }
        Ok(Self {
            approved,
            reason,
            idempotency_key: Uuid::new_v4().to_string(),
        })
    }

    pub fn approve(reason: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(true, reason)
    }

    pub fn reject(reason: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(false, reason)
    }

    pub fn action(&self) -> &'static str {
        if self.approved { "approve" } else { "reject" }
    }

    /// Reuse a key when resubmitting the same logical decision.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = key.into();
        self
    }
}
