/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for qubic-task-adapter tests

use qubic_task_adapter::{ClientConfig, GatewayClient};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock gateway with short timeouts
pub fn client_for(server: &MockServer) -> GatewayClient {
    let config = ClientConfig {
        timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
    };
    GatewayClient::with_config_and_base_url(config, &server.uri()).expect("client init")
}

/// Gateway status payload
pub fn status_body(task_id: &str, status: &str, current_step: Option<u32>) -> Value {
    json!({
        "task_id": task_id,
        "status": status,
        "created_at": "2026-10-01T12:00:00.000001",
        "updated_at": "2026-10-01T12:00:03.000001",
        "plan_id": "plan-1",
        "current_step": current_step,
        "total_steps": 3,
        "requires_approval": status == "waiting_approval",
    })
}

/// Mock bearer token for testing
pub fn mock_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}
