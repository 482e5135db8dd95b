//! HTTP-level tests for the algod chain client.
//!
//! Uses `wiremock` to mock node responses for params, submission,
//! confirmation, and account queries.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_bytes, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use algorand_agent_client::domain::{AppError, ChainClient, ChainError, SignedTransaction};
use algorand_agent_client::infra::{AlgodChainClient, AlgodConfig};

fn client(server: &MockServer) -> AlgodChainClient {
    AlgodChainClient::new(AlgodConfig::new(
        server.uri(),
        SecretString::from("test-token"),
    ))
}

#[tokio::test]
async fn test_suggested_params_mapping_and_validity_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/transactions/params"))
        .and(header("X-Algo-API-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "consensus-version": "future",
            "fee": 0,
            "min-fee": 1000,
            "last-round": 35_000_000u64,
            "genesis-id": "testnet-v1.0",
            "genesis-hash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI="
        })))
        .mount(&mock_server)
        .await;

    let params = client(&mock_server).suggested_params().await.unwrap();

    assert_eq!(params.min_fee, 1000);
    assert_eq!(params.first_round, 35_000_000);
    assert_eq!(params.last_round, 35_001_000);
    assert_eq!(params.genesis_id, "testnet-v1.0");
}

#[tokio::test]
async fn test_submit_raw_posts_bytes_and_returns_tx_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .and(header("Content-Type", "application/x-binary"))
        .and(body_bytes(vec![1u8, 2, 3]))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "txId": "H2KKVITXKWL2VH3S2QJM5B6H2NSNGFXMJZTZ2HGZQ2QQ"
        })))
        .mount(&mock_server)
        .await;

    let tx_id = client(&mock_server)
        .submit_raw(&SignedTransaction(vec![1, 2, 3]))
        .await
        .unwrap();

    assert_eq!(tx_id, "H2KKVITXKWL2VH3S2QJM5B6H2NSNGFXMJZTZ2HGZQ2QQ");
}

#[tokio::test]
async fn test_submit_raw_rejection_carries_node_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("TransactionPool.Remember: transaction already in ledger"),
        )
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .submit_raw(&SignedTransaction(vec![0]))
        .await;

    match result {
        Err(AppError::Chain(ChainError::Rejected(msg))) => {
            assert!(msg.contains("already in ledger"));
        }
        other => panic!("Expected Rejected, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_wait_for_confirmation_polls_pending_until_confirmed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 100 })))
        .mount(&mock_server)
        .await;

    // First pending check: not yet confirmed
    Mock::given(method("GET"))
        .and(path("/v2/transactions/pending/TX1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "txn": {} })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/transactions/pending/TX1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "confirmed-round": 101, "txn": {} })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/status/wait-for-block-after/100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 101 })))
        .mount(&mock_server)
        .await;

    let round = client(&mock_server)
        .wait_for_confirmation("TX1", 4)
        .await
        .unwrap();

    assert_eq!(round, 101);
}

#[tokio::test]
async fn test_wait_for_confirmation_fails_on_pool_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 100 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/transactions/pending/TX2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pool-error": "transaction rejected: overspend",
            "txn": {}
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).wait_for_confirmation("TX2", 4).await;

    match result {
        Err(AppError::Chain(ChainError::Rejected(msg))) => {
            assert!(msg.contains("overspend"));
        }
        other => panic!("Expected Rejected, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_wait_for_confirmation_times_out_as_unavailable_after_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 100 })))
        .mount(&mock_server)
        .await;
    // Never confirms
    Mock::given(method("GET"))
        .and(path("/v2/transactions/pending/TX3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "txn": {} })))
        .expect(4)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/status/wait-for-block-after/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "last-round": 104 })))
        .expect(4)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).wait_for_confirmation("TX3", 4).await;

    // Exhausting the window is reported as a timeout, not a rejection:
    // the transaction may still confirm in a later round.
    match result {
        Err(AppError::Chain(ChainError::Unavailable(msg))) => {
            assert!(msg.contains("not confirmed within 4 rounds"), "msg: {msg}");
        }
        other => panic!("Expected Unavailable, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_account_balance() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/accounts/SOMEADDRESS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": "SOMEADDRESS",
            "amount": 4_250_000u64,
            "min-balance": 100_000
        })))
        .mount(&mock_server)
        .await;

    let balance = client(&mock_server)
        .account_balance("SOMEADDRESS")
        .await
        .unwrap();

    assert_eq!(balance, 4_250_000);
}

#[tokio::test]
async fn test_health_check_maps_failure_to_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).health_check().await;
    assert!(matches!(
        result,
        Err(AppError::Chain(ChainError::Unavailable(_)))
    ));
}
