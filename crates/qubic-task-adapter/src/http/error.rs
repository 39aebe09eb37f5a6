/*
[INPUT]:  Error sources (validation, transport, HTTP status, serialization, gating)
[OUTPUT]: Structured error types with recoverability hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::{TaskStatus, ValidationError};

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Input rejected before any remote call
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Transport failure, timeout, or engine-side outage
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// The referenced task or audit log does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// A transition-gated action was attempted outside its legal state
    #[error("Invalid state for task {task_id}: {status:?} ({action} requires waiting_approval)")]
    InvalidState {
        task_id: String,
        status: Option<TaskStatus>,
        action: &'static str,
    },

    /// API returned an unexpected non-success response
    #[error("API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return GatewayError::Api {
                code: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: format!("undecodable response body: {err}"),
            };
        }
        if err.is_builder() {
            return GatewayError::Config(err.to_string());
        }
        GatewayError::ServiceUnavailable {
            message: err.to_string(),
        }
    }
}

impl GatewayError {
    /// Check if the error is absorbed by the next poll tick or a resubmission
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::ServiceUnavailable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    /// Map a non-success HTTP status to the error taxonomy
    pub fn from_status(
        status: StatusCode,
        resource: &'static str,
        id: &str,
        message: impl Into<String>,
    ) -> Self {
        if status == StatusCode::NOT_FOUND {
            return GatewayError::NotFound {
                resource,
                id: id.to_string(),
            };
        }
        if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            return GatewayError::ServiceUnavailable {
                message: format!("HTTP {}: {}", status.as_u16(), message.into()),
            };
        }
        GatewayError::Api {
            code: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn invalid_state(
        task_id: impl Into<String>,
        status: Option<TaskStatus>,
        action: &'static str,
    ) -> Self {
        GatewayError::InvalidState {
            task_id: task_id.into(),
            status,
            action,
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
