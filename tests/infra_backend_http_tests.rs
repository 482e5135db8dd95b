//! HTTP-level tests for the agent backend client.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use algorand_agent_client::domain::{AgentBackend, AppError, BackendError, TaskStatus};
use algorand_agent_client::infra::{BackendConfig, HttpAgentBackend};

fn client(server: &MockServer) -> HttpAgentBackend {
    HttpAgentBackend::new(BackendConfig::new(server.uri()))
}

#[tokio::test]
async fn test_submit_generation_returns_task_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({ "prompt": "Create a counter contract" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "b7a9c1d2"
        })))
        .mount(&mock_server)
        .await;

    let task_id = client(&mock_server)
        .submit_generation("Create a counter contract")
        .await
        .unwrap();

    assert_eq!(task_id, "b7a9c1d2");
}

#[tokio::test]
async fn test_submit_generation_surfaces_detail_on_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": "Prompt exceeds the maximum length"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).submit_generation("x".repeat(100_000).as_str()).await;

    match result {
        Err(AppError::Backend(BackendError::SubmissionRejected(detail))) => {
            assert_eq!(detail, "Prompt exceeds the maximum length");
        }
        other => panic!("Expected SubmissionRejected, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_task_status_deserializes_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status/task-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "in_progress",
            "logs": ["PLANNER: analyzing prompt", "CODER: writing contract"]
        })))
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server).task_status("task-9").await.unwrap();

    assert_eq!(snapshot.status, TaskStatus::InProgress);
    assert_eq!(snapshot.logs.len(), 2);
    assert!(snapshot.result.is_none());
}

#[tokio::test]
async fn test_task_status_completed_with_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status/task-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "logs": [],
            "result": {
                "app_id": "7421",
                "message": "Contract deployed successfully",
                "contract_name": "Counter",
                "transaction_id": "TXABC"
            }
        })))
        .mount(&mock_server)
        .await;

    let snapshot = client(&mock_server).task_status("task-9").await.unwrap();
    let result = snapshot.result.unwrap();

    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(result.app_id, "7421");
    assert_eq!(result.transaction_id.as_deref(), Some("TXABC"));
}

#[tokio::test]
async fn test_task_status_error_is_polling_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Task not found"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).task_status("missing").await;

    match result {
        Err(AppError::Backend(BackendError::PollingTransport(msg))) => {
            assert!(msg.contains("Task not found"));
        }
        other => panic!("Expected PollingTransport, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_payment_config_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/payment-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "receiver_address": "FEESINKADDRESS",
            "deployment_cost": 0.75
        })))
        .mount(&mock_server)
        .await;

    let config = client(&mock_server).payment_config().await.unwrap();

    assert_eq!(config.receiver_address, "FEESINKADDRESS");
    assert_eq!(config.deployment_cost, 0.75);
}

#[tokio::test]
async fn test_verify_payment_posts_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/verify-payment"))
        .and(body_json(json!({
            "transaction_id": "TX1",
            "wallet_address": "SENDER"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verified": true,
            "amount": 0.5,
            "message": "Payment verified"
        })))
        .mount(&mock_server)
        .await;

    let verification = client(&mock_server)
        .verify_payment("TX1", "SENDER")
        .await
        .unwrap();

    assert!(verification.verified);
    assert_eq!(verification.amount, 0.5);
}

#[tokio::test]
async fn test_health_retries_once_on_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let health = client(&mock_server).health().await.unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_health_fails_after_second_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).health().await;
    assert!(matches!(
        result,
        Err(AppError::Backend(BackendError::Rejected(_)))
    ));
}
