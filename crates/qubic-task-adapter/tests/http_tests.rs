/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for HTTP client
[POS]:    Integration tests - gateway endpoints
[UPDATE]: When gateway endpoints change
*/

mod common;

use common::{client_for, mock_token, setup_mock_server, status_body};
use qubic_task_adapter::{
    ClientConfig, CreateTaskRequest, Decision, GatewayClient, GatewayError, StepStatus, TaskApi,
    TaskParameters, TaskStatus, TaskType,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn test_client_creation() {
    let _client = assert_ok!(GatewayClient::new());
}

#[test]
fn test_client_with_config() {
    let config = ClientConfig::default();
    let client = assert_ok!(GatewayClient::with_config(config));
    assert_eq!(client.base_url().as_str(), "http://localhost:8000/");
}

#[test]
fn test_client_auth_token_roundtrip() {
    let mut client = assert_ok!(GatewayClient::new());
    assert!(client.auth_token().is_none());
    client.set_auth_token(mock_token());
    assert_eq!(client.auth_token(), Some(mock_token().as_str()));
}

#[tokio::test]
async fn test_create_task_sends_body_and_idempotency_key() {
    let server = setup_mock_server().await;
    let request = CreateTaskRequest::new(
        TaskType::MonitorWallet,
        None,
        TaskParameters::wallet("WALLETADDRESS"),
    )
    .expect("valid request");

    Mock::given(method("POST"))
        .and(path("/task/start"))
        .and(header("Idempotency-Key", request.idempotency_key.as_str()))
        .and(body_partial_json(json!({
            "task_type": "monitor_wallet",
            "wallet_address": "WALLETADDRESS",
            "description": "Monitor wallet balance",
            "parameters": {"wallet_address": "WALLETADDRESS"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-1",
            "status": "pending",
            "message": "Task started successfully",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.create_task(&request).await);
    assert_eq!(response.task_id, "t-1");
    assert_eq!(response.status, TaskStatus::Pending);

    let snapshot = response.into_snapshot(TaskType::MonitorWallet);
    assert_eq!(snapshot.task_type, Some(TaskType::MonitorWallet));
    assert_eq!(snapshot.message.as_deref(), Some("Task started successfully"));
}

#[tokio::test]
async fn test_get_task_status() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/task/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("t-1", "executing", Some(1))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = assert_ok!(client.get_task_status("t-1").await);
    assert_eq!(snapshot.status, TaskStatus::Executing);
    assert_eq!(snapshot.progress(), Some((1, 3)));
    assert_eq!(snapshot.plan_id.as_deref(), Some("plan-1"));
    assert!(!snapshot.requires_approval);
}

#[tokio::test]
async fn test_get_task_status_not_found() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/task/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Task not found"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_task_status("missing").await.unwrap_err();
    match err {
        GatewayError::NotFound { resource, id } => {
            assert_eq!(resource, "task");
            assert_eq!(id, "missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_service_unavailable() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/task/t-1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Failed to fetch runtime"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_task_status("t-1").await.unwrap_err();
    assert!(err.is_retryable(), "expected retryable error, got {err:?}");
    assert!(err.to_string().contains("Failed to fetch runtime"));
}

#[tokio::test]
async fn test_transport_failure_is_service_unavailable() {
    // Reserve a port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let uri = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let client = assert_ok!(GatewayClient::with_config_and_base_url(
        ClientConfig {
            timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(200),
        },
        &uri,
    ));
    let err = client.get_task_status("t-1").await.unwrap_err();
    assert!(matches!(err, GatewayError::ServiceUnavailable { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_submit_decision() {
    let server = setup_mock_server().await;
    let decision = Decision::approve("ok").expect("valid decision");

    Mock::given(method("POST"))
        .and(path("/task/t-1/approve"))
        .and(header_exists("Idempotency-Key"))
        .and(body_partial_json(json!({"approved": true, "reason": "ok"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-1",
            "approved": true,
            "message": "Approval processed successfully",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.submit_decision("t-1", &decision).await);
    assert!(response.approved);
}

#[tokio::test]
async fn test_refused_decision_is_invalid_state() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/task/t-1/approve"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Task is not waiting for approval"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let decision = Decision::reject("changed my mind").expect("valid decision");
    let err = client.submit_decision("t-1", &decision).await.unwrap_err();
    assert!(
        matches!(err, GatewayError::InvalidState { action: "reject", .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_refusal_relayed_as_server_error_is_invalid_state() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/task/t-1/approve"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Failed to process approval: Client error '400 Bad Request' for url 'http://agent-runtime:8002/task/t-1/approve'"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let decision = Decision::approve("looks fine").expect("valid decision");
    let err = client.submit_decision("t-1", &decision).await.unwrap_err();
    assert!(
        matches!(err, GatewayError::InvalidState { action: "approve", .. }),
        "got {err:?}"
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_engine_outage_on_decision_stays_retryable() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/task/t-1/approve"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Failed to process approval: Server error '503 Service Unavailable' for url 'http://agent-runtime:8002/task/t-1/approve'"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let decision = Decision::approve("looks fine").expect("valid decision");
    let err = client.submit_decision("t-1", &decision).await.unwrap_err();
    assert!(err.is_retryable(), "got {err:?}");
}

#[tokio::test]
async fn test_get_audit_log() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/audit/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-1",
            "logs": [
                {"id": 1, "step_index": 1, "step_type": "check_balance", "status": "success",
                 "input_hash": "ab", "output_hash": "cd", "timestamp": "2026-10-01T12:00:01", "qubic_txid": null},
                {"id": 2, "step_index": 3, "step_type": "onchain_action", "status": "success",
                 "input_hash": "ef", "output_hash": "01", "timestamp": "2026-10-01T12:00:02", "qubic_txid": "QTX1"}
            ],
            "qubic_txid": "QTX1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let log = assert_ok!(client.get_audit_log("t-1").await);
    assert_eq!(log.logs.len(), 2);
    assert_eq!(log.logs[0].step_type, "check_balance");
    assert_eq!(log.logs[0].status, StepStatus::Success);
    assert!(log.logs[1].is_on_chain());
    assert_eq!(log.latest_txid.as_deref(), Some("QTX1"));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("Authorization", format!("Bearer {}", mock_token()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "api-gateway",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.set_auth_token(mock_token());
    let health = assert_ok!(client.health().await);
    assert!(health.is_healthy());
}

#[tokio::test]
async fn test_client_through_trait_object() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/task/t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("t-9", "planning", None)))
        .mount(&server)
        .await;

    let api: Arc<dyn TaskApi> = Arc::new(client_for(&server));
    let snapshot = assert_ok!(api.get_task_status("t-9").await);
    assert_eq!(snapshot.status, TaskStatus::Unknown("planning".to_string()));
}
