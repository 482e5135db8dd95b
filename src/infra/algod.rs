//! Algod node client implementation.
//!
//! A thin façade over the algod REST API. Each trait operation maps to
//! one node endpoint; node errors surface as `ChainError` variants
//! without interpretation and with no retry beyond the transport's own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::domain::{AppError, ChainClient, ChainError, SignedTransaction, SuggestedParams};

/// Validity window for suggested params, matching the node SDK default
pub const DEFAULT_VALIDITY_ROUNDS: u64 = 1000;

/// Configuration for the algod client
#[derive(Debug, Clone)]
pub struct AlgodConfig {
    /// Node base URL, e.g. `https://testnet-api.algonode.cloud`
    pub base_url: String,
    /// Node API token, sent as `X-Algo-API-Token`
    pub token: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AlgodConfig {
    #[must_use]
    pub fn new(base_url: String, token: SecretString) -> Self {
        Self {
            base_url,
            token,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NodeStatusResponse {
    #[serde(rename = "last-round")]
    last_round: u64,
}

#[derive(Debug, Deserialize)]
struct TransactionParamsResponse {
    fee: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
    #[serde(rename = "last-round")]
    last_round: u64,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
struct PendingTransactionResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: u64,
    #[serde(rename = "pool-error", default)]
    pool_error: String,
}

#[derive(Debug, Deserialize)]
struct SubmitTransactionResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    amount: u64,
}

/// Chain client backed by an algod node's REST API
#[derive(Debug, Clone)]
pub struct AlgodChainClient {
    http_client: Client,
    config: AlgodConfig,
}

impl AlgodChainClient {
    /// Create a new algod client
    pub fn new(config: AlgodConfig) -> Self {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.url(path);
        debug!(url = %url, "Calling algod");

        let response = self
            .http_client
            .get(&url)
            .header("X-Algo-API-Token", self.config.token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %url, "Algod request failed");
                AppError::Chain(ChainError::Unavailable(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, url = %url, "Algod returned error");
            return Err(AppError::Chain(ChainError::Rejected(format!(
                "{}: {}",
                status, body
            ))));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to parse algod response");
            AppError::Chain(ChainError::Unavailable(e.to_string()))
        })
    }

    async fn last_round(&self) -> Result<u64, AppError> {
        let status: NodeStatusResponse = self.get_json("/v2/status").await?;
        Ok(status.last_round)
    }

    /// Block until the node reaches a round after `round`
    async fn wait_for_round(&self, round: u64) -> Result<(), AppError> {
        let path = format!("/v2/status/wait-for-block-after/{}", round);
        let _: NodeStatusResponse = self.get_json(&path).await?;
        Ok(())
    }

    async fn pending_transaction(
        &self,
        tx_id: &str,
    ) -> Result<PendingTransactionResponse, AppError> {
        let path = format!("/v2/transactions/pending/{}", tx_id);
        self.get_json(&path).await
    }
}

#[async_trait]
impl ChainClient for AlgodChainClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let url = self.url("/health");
        let response = self
            .http_client
            .get(&url)
            .header("X-Algo-API-Token", self.config.token.expose_secret())
            .send()
            .await
            .map_err(|e| AppError::Chain(ChainError::Unavailable(e.to_string())))?;

        if !response.status().is_success() {
            return Err(AppError::Chain(ChainError::Unavailable(format!(
                "health check returned {}",
                response.status()
            ))));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn suggested_params(&self) -> Result<SuggestedParams, AppError> {
        let params: TransactionParamsResponse = self.get_json("/v2/transactions/params").await?;
        Ok(SuggestedParams {
            fee: params.fee,
            min_fee: params.min_fee,
            first_round: params.last_round,
            last_round: params.last_round + DEFAULT_VALIDITY_ROUNDS,
            genesis_id: params.genesis_id,
            genesis_hash: params.genesis_hash,
        })
    }

    #[instrument(skip(self, signed))]
    async fn submit_raw(&self, signed: &SignedTransaction) -> Result<String, AppError> {
        let url = self.url("/v2/transactions");

        let response = self
            .http_client
            .post(&url)
            .header("X-Algo-API-Token", self.config.token.expose_secret())
            .header("Content-Type", "application/x-binary")
            .body(signed.0.clone())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Transaction submission failed");
                AppError::Chain(ChainError::Unavailable(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Node rejected transaction");
            return Err(AppError::Chain(ChainError::Rejected(body)));
        }

        let submit: SubmitTransactionResponse = response.json().await.map_err(|e| {
            AppError::Chain(ChainError::Unavailable(e.to_string()))
        })?;

        debug!(tx_id = %submit.tx_id, "Transaction submitted");
        Ok(submit.tx_id)
    }

    #[instrument(skip(self))]
    async fn wait_for_confirmation(&self, tx_id: &str, max_rounds: u64) -> Result<u64, AppError> {
        let start_round = self.last_round().await?;
        let mut current_round = start_round;

        while current_round < start_round + max_rounds {
            let pending = self.pending_transaction(tx_id).await?;

            if !pending.pool_error.is_empty() {
                return Err(AppError::Chain(ChainError::Rejected(pending.pool_error)));
            }
            if pending.confirmed_round > 0 {
                debug!(tx_id = %tx_id, round = pending.confirmed_round, "Transaction confirmed");
                return Ok(pending.confirmed_round);
            }

            self.wait_for_round(current_round).await?;
            current_round += 1;
        }

        // Exhausting the round window is a timeout, not a node
        // rejection: the transaction may still confirm later.
        Err(AppError::Chain(ChainError::Unavailable(format!(
            "transaction {} not confirmed within {} rounds",
            tx_id, max_rounds
        ))))
    }

    #[instrument(skip(self))]
    async fn account_balance(&self, address: &str) -> Result<u64, AppError> {
        let path = format!("/v2/accounts/{}", address);
        let account: AccountResponse = self.get_json(&path).await?;
        Ok(account.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_params_deserialization() {
        let json = serde_json::json!({
            "consensus-version": "future",
            "fee": 0,
            "min-fee": 1000,
            "last-round": 35_000_000u64,
            "genesis-id": "testnet-v1.0",
            "genesis-hash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI="
        });
        let params: TransactionParamsResponse = serde_json::from_value(json).unwrap();
        assert_eq!(params.min_fee, 1000);
        assert_eq!(params.last_round, 35_000_000);
        assert_eq!(params.genesis_id, "testnet-v1.0");
    }

    #[test]
    fn test_pending_transaction_defaults() {
        let json = serde_json::json!({ "txn": {} });
        let pending: PendingTransactionResponse = serde_json::from_value(json).unwrap();
        assert_eq!(pending.confirmed_round, 0);
        assert!(pending.pool_error.is_empty());
    }

    #[test]
    fn test_config_defaults_to_thirty_second_timeout() {
        let config = AlgodConfig::new(
            "http://localhost:4001".to_string(),
            SecretString::from("token"),
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
