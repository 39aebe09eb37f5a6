/*
[INPUT]:  Mock gateway server and observation views
[OUTPUT]: Shared fixtures, mock helpers, and view waiters
[POS]:    Test infrastructure - shared across observer integration tests
[UPDATE]: When adding new test patterns or fixtures
*/

#![allow(dead_code)]

use qubic_task_adapter::{ClientConfig, GatewayClient, TaskApi};
use qubic_task_observer::ObservationView;
use qubic_task_observer::config::PollingConfig;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Slow enough that only the immediate first tick fires during a test
pub const MANUAL_INTERVAL_MS: u64 = 60_000;

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn api_for(server: &MockServer) -> Arc<dyn TaskApi> {
    let config = ClientConfig {
        timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
    };
    Arc::new(GatewayClient::with_config_and_base_url(config, &server.uri()).expect("client init"))
}

pub fn polling(interval_ms: u64, stop_on_terminal: bool) -> PollingConfig {
    PollingConfig {
        interval_ms,
        stop_on_terminal,
    }
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

/// Audit service payload; each step is `(step_index, step_type, status, qubic_txid)`
pub fn audit_body(task_id: &str, steps: &[(u32, &str, &str, Option<&str>)]) -> Value {
    let logs: Vec<Value> = steps
        .iter()
        .map(|(step_index, step_type, status, txid)| {
            json!({
                "step_index": step_index,
                "step_type": step_type,
                "input_hash": "a1b2",
                "output_hash": "c3d4",
                "qubic_txid": txid,
                "status": status,
                "timestamp": "2026-10-01T12:00:02.000001",
            })
        })
        .collect();
    json!({ "task_id": task_id, "logs": logs })
}

/// Serve `status` for the next `times` status requests (unlimited when `None`).
pub async fn mount_status(
    server: &MockServer,
    task_id: &str,
    status: &str,
    current_step: Option<u32>,
    times: Option<u64>,
) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/task/{task_id}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body(task_id, status, current_step)),
        );
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

pub async fn mount_audit(server: &MockServer, task_id: &str, steps: &[(u32, &str, &str, Option<&str>)]) {
    Mock::given(method("GET"))
        .and(path(format!("/audit/{task_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(audit_body(task_id, steps)))
        .mount(server)
        .await;
}

/// Serve `steps` for the next `times` audit requests.
pub async fn mount_audit_times(
    server: &MockServer,
    task_id: &str,
    steps: &[(u32, &str, &str, Option<&str>)],
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/audit/{task_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(audit_body(task_id, steps)))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Fail audit requests with `status` (every request when `times` is `None`).
pub async fn mount_audit_failure(server: &MockServer, task_id: &str, status: u16, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/audit/{task_id}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"detail": "audit down"})));
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

pub async fn status_request_count(server: &MockServer, task_id: &str) -> usize {
    let wanted = format!("/task/{task_id}");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == "GET" && request.url.path() == wanted)
        .count()
}

/// Wait until the published view satisfies `predicate`.
pub async fn wait_for_view<F>(rx: &mut watch::Receiver<ObservationView>, predicate: F) -> ObservationView
where
    F: FnMut(&ObservationView) -> bool,
{
    let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("view condition not reached in time")
        .expect("view sender dropped");
    (*view).clone()
}
