//! HTTP client for the agent backend REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use crate::domain::{
    AgentBackend, AppError, BackendError, GenerateResponse, PaymentConfig, PaymentVerification,
    TaskStatusResponse, VerifyPaymentRequest,
};

/// Configuration for the agent backend client
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Agent backend client over its REST contract
#[derive(Debug, Clone)]
pub struct HttpAgentBackend {
    http_client: Client,
    config: BackendConfig,
}

impl HttpAgentBackend {
    /// Create a new backend client
    pub fn new(config: BackendConfig) -> Self {
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

    /// Extract the `detail` field from an error body, falling back to
    /// the raw body text.
    fn error_detail(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    #[instrument(skip(self, prompt))]
    async fn submit_generation(&self, prompt: &str) -> Result<String, AppError> {
        let url = self.url("/api/generate");
        debug!(url = %url, "Submitting generation prompt");

        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Generation submission failed");
                AppError::Backend(BackendError::Transport(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = Self::error_detail(&body);
            error!(status = %status, detail = %detail, "Backend rejected generation request");
            return Err(AppError::Backend(BackendError::SubmissionRejected(detail)));
        }

        let generated: GenerateResponse = response.json().await.map_err(|e| {
            AppError::Backend(BackendError::Transport(e.to_string()))
        })?;
        Ok(generated.task_id)
    }

    #[instrument(skip(self))]
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, AppError> {
        let url = self.url(&format!("/api/status/{}", task_id));

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            AppError::Backend(BackendError::PollingTransport(e.to_string()))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(BackendError::PollingTransport(format!(
                "{}: {}",
                status,
                Self::error_detail(&body)
            ))));
        }

        response.json::<TaskStatusResponse>().await.map_err(|e| {
            AppError::Backend(BackendError::PollingTransport(e.to_string()))
        })
    }

    #[instrument(skip(self))]
    async fn payment_config(&self) -> Result<PaymentConfig, AppError> {
        let url = self.url("/api/payment-config");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            AppError::Backend(BackendError::Transport(e.to_string()))
        })?;

        if !response.status().is_success() {
            return Err(AppError::Backend(BackendError::Rejected(format!(
                "payment config fetch returned {}",
                response.status()
            ))));
        }

        response.json::<PaymentConfig>().await.map_err(|e| {
            AppError::Backend(BackendError::Transport(e.to_string()))
        })
    }

    #[instrument(skip(self))]
    async fn verify_payment(
        &self,
        transaction_id: &str,
        wallet_address: &str,
    ) -> Result<PaymentVerification, AppError> {
        let url = self.url("/api/verify-payment");
        let request = VerifyPaymentRequest {
            transaction_id: transaction_id.to_string(),
            wallet_address: wallet_address.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Backend(BackendError::Transport(e.to_string())))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Payment verification rejected");
            return Err(AppError::Backend(BackendError::Rejected(
                Self::error_detail(&body),
            )));
        }

        response.json::<PaymentVerification>().await.map_err(|e| {
            AppError::Backend(BackendError::Transport(e.to_string()))
        })
    }

    /// Liveness probe with a single retry, since the backend may be
    /// cold-starting.
    #[instrument(skip(self))]
    async fn health(&self) -> Result<serde_json::Value, AppError> {
        let url = self.url("/api/health");

        let fetch = || async {
            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .map_err(|e| AppError::Backend(BackendError::Transport(e.to_string())))?;

            if !response.status().is_success() {
                return Err(AppError::Backend(BackendError::Rejected(format!(
                    "health check returned {}",
                    response.status()
                ))));
            }

            response.json::<serde_json::Value>().await.map_err(|e| {
                AppError::Backend(BackendError::Transport(e.to_string()))
            })
        };

        match fetch().await {
            Ok(value) => Ok(value),
            Err(first) => {
                warn!(error = %first, "Backend health check failed, retrying once");
                fetch().await
            }
        }
    }
}
