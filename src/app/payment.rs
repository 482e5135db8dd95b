//! Payment flow: build, sign, submit, and confirm the deployment fee
//! transaction.
//!
//! State machine per attempt:
//! `Idle -> Processing -> Confirming -> Succeeded` or
//! `Idle -> Processing -> Failed`. Exactly one attempt per invocation;
//! retry is a fresh user-initiated call.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AgentBackend, AppError, ChainClient, PaymentConfig, PaymentError, PaymentOutcome, PaymentPhase,
    PaymentRequest, PaymentVerification, UnsignedTransaction, algos_to_micro, classify_failure,
};

use super::wallet::WalletSessionManager;

/// Rounds to wait for on-chain confirmation before failing the attempt
pub const CONFIRMATION_ROUNDS: u64 = 4;

/// Orchestrates one deployment-fee payment at a time
pub struct PaymentFlow {
    wallet: Arc<WalletSessionManager>,
    chain: Arc<dyn ChainClient>,
    backend: Arc<dyn AgentBackend>,
    config: RwLock<PaymentConfig>,
    phase_tx: watch::Sender<PaymentPhase>,
}

impl PaymentFlow {
    #[must_use]
    pub fn new(
        wallet: Arc<WalletSessionManager>,
        chain: Arc<dyn ChainClient>,
        backend: Arc<dyn AgentBackend>,
        defaults: PaymentConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(PaymentPhase::Idle);
        Self {
            wallet,
            chain,
            backend,
            config: RwLock::new(defaults),
            phase_tx,
        }
    }

    /// Subscribe to phase transitions (replay-latest)
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<PaymentPhase> {
        self.phase_tx.subscribe()
    }

    /// The current phase
    #[must_use]
    pub fn phase(&self) -> PaymentPhase {
        *self.phase_tx.borrow()
    }

    /// Return the phase to `Idle`, e.g. before a user-initiated retry
    pub fn reset_phase(&self) {
        self.phase_tx.send_replace(PaymentPhase::Idle);
    }

    /// Fetch the payment configuration from the backend.
    ///
    /// Failure falls back to the configured defaults without surfacing
    /// an error: the fee screen stays usable offline.
    #[instrument(skip(self))]
    pub async fn load_config(&self) {
        match self.backend.payment_config().await {
            Ok(config) => {
                info!(cost = %config.deployment_cost, "Payment config loaded from backend");
                *self.config.write().await = config;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load payment config, using defaults");
            }
        }
    }

    pub async fn deployment_cost(&self) -> f64 {
        self.config.read().await.deployment_cost
    }

    pub async fn receiver_address(&self) -> String {
        self.config.read().await.receiver_address.clone()
    }

    /// Pay the configured deployment fee to the configured receiver
    pub async fn pay_deployment_fee(&self) -> Result<PaymentOutcome, AppError> {
        let config = self.config.read().await.clone();
        let request = PaymentRequest::new(config.receiver_address, config.deployment_cost);
        self.send_payment(&request).await
    }

    /// Execute one payment attempt.
    ///
    /// Pre-flight failures (`WalletNotConnected`, `InsufficientBalance`)
    /// are returned as errors before any network call. Once processing
    /// begins, every failure is reported as a typed
    /// [`PaymentOutcome::Failure`] with a classified reason; the raw
    /// error is always logged first.
    #[instrument(skip(self, request), fields(receiver = %request.receiver_address, amount = %request.amount_algos))]
    pub async fn send_payment(&self, request: &PaymentRequest) -> Result<PaymentOutcome, AppError> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let session = self.wallet.current();
        if !session.connected {
            return Err(PaymentError::WalletNotConnected.into());
        }

        let required_micro = algos_to_micro(request.amount_algos);
        if session.balance_micro < required_micro {
            return Err(PaymentError::InsufficientBalance {
                required_micro,
                available_micro: session.balance_micro,
            }
            .into());
        }

        let sender = session
            .address
            .clone()
            .ok_or(PaymentError::WalletNotConnected)?;

        self.phase_tx.send_replace(PaymentPhase::Processing);

        match self
            .execute(sender, &request.receiver_address, required_micro)
            .await
        {
            Ok(transaction_id) => {
                // Refresh must be attempted before the outcome is final,
                // fire-and-forget is not acceptable here.
                self.wallet.refresh_balance().await;
                self.phase_tx.send_replace(PaymentPhase::Succeeded);
                info!(transaction_id = %transaction_id, "Payment confirmed");
                Ok(PaymentOutcome::Success { transaction_id })
            }
            Err(e) => {
                warn!(error = %e, "Payment attempt failed");
                let reason = classify_failure(&e);
                self.phase_tx.send_replace(PaymentPhase::Failed);
                Ok(PaymentOutcome::Failure { reason })
            }
        }
    }

    async fn execute(
        &self,
        sender: String,
        receiver: &str,
        amount_micro: u64,
    ) -> Result<String, AppError> {
        let params = self.chain.suggested_params().await?;
        let txn =
            UnsignedTransaction::payment(sender, receiver.to_string(), amount_micro, params);

        // Sign exactly this one transaction at index 0
        let signer = self.wallet.transaction_signer().await?;
        let signed = signer.sign(&[txn], &[0]).await?;
        let Some(signed_txn) = signed.into_iter().next().flatten() else {
            return Err(PaymentError::SigningCancelled.into());
        };

        self.phase_tx.send_replace(PaymentPhase::Confirming);

        let transaction_id = self.chain.submit_raw(&signed_txn).await?;
        self.chain
            .wait_for_confirmation(&transaction_id, CONFIRMATION_ROUNDS)
            .await
            .map_err(|e| {
                warn!(transaction_id = %transaction_id, error = %e, "Confirmation failed");
                PaymentError::ChainConfirmationFailed(e.to_string())
            })?;

        Ok(transaction_id)
    }

    /// Ask the backend to verify an on-chain payment.
    ///
    /// Advisory: the result is not consulted by the payment flow itself.
    pub async fn verify_payment(
        &self,
        transaction_id: &str,
        wallet_address: &str,
    ) -> Result<PaymentVerification, AppError> {
        self.backend
            .verify_payment(transaction_id, wallet_address)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::{
        BackendError, PaymentVerification, SessionStore, TaskStatusResponse,
    };

    struct StubBackend {
        config: Option<PaymentConfig>,
    }

    #[async_trait]
    impl AgentBackend for StubBackend {
        async fn submit_generation(&self, _prompt: &str) -> Result<String, AppError> {
            unimplemented!("not used in payment config tests")
        }

        async fn task_status(&self, _task_id: &str) -> Result<TaskStatusResponse, AppError> {
            unimplemented!("not used in payment config tests")
        }

        async fn payment_config(&self) -> Result<PaymentConfig, AppError> {
            self.config
                .clone()
                .ok_or_else(|| BackendError::Transport("backend down".to_string()).into())
        }

        async fn verify_payment(
            &self,
            _transaction_id: &str,
            _wallet_address: &str,
        ) -> Result<PaymentVerification, AppError> {
            unimplemented!("not used in payment config tests")
        }

        async fn health(&self) -> Result<serde_json::Value, AppError> {
            Ok(serde_json::json!({"status": "ok"}))
        }
    }

    struct NeverChain;

    #[async_trait]
    impl crate::domain::ChainClient for NeverChain {
        async fn health_check(&self) -> Result<(), AppError> {
            Ok(())
        }

        async fn suggested_params(
            &self,
        ) -> Result<crate::domain::SuggestedParams, AppError> {
            unimplemented!("not used in payment config tests")
        }

        async fn submit_raw(
            &self,
            _signed: &crate::domain::SignedTransaction,
        ) -> Result<String, AppError> {
            unimplemented!("not used in payment config tests")
        }

        async fn wait_for_confirmation(
            &self,
            _tx_id: &str,
            _max_rounds: u64,
        ) -> Result<u64, AppError> {
            unimplemented!("not used in payment config tests")
        }

        async fn account_balance(&self, _address: &str) -> Result<u64, AppError> {
            Ok(0)
        }
    }

    struct NoopStore;

    impl SessionStore for NoopStore {
        fn save(&self, _provider_id: &str) {}
        fn clear(&self) {}
        fn load(&self) -> Option<String> {
            None
        }
    }

    fn flow_with_backend(backend: StubBackend) -> PaymentFlow {
        let chain = Arc::new(NeverChain);
        let wallet = Arc::new(WalletSessionManager::new(
            chain.clone() as _,
            Arc::new(NoopStore) as _,
            vec![],
        ));
        PaymentFlow::new(wallet, chain as _, Arc::new(backend) as _, PaymentConfig::default())
    }

    #[tokio::test]
    async fn test_load_config_from_backend() {
        let flow = flow_with_backend(StubBackend {
            config: Some(PaymentConfig {
                receiver_address: "RECEIVER".to_string(),
                deployment_cost: 1.25,
            }),
        });

        flow.load_config().await;
        assert_eq!(flow.deployment_cost().await, 1.25);
        assert_eq!(flow.receiver_address().await, "RECEIVER");
    }

    #[tokio::test]
    async fn test_load_config_falls_back_to_defaults() {
        let flow = flow_with_backend(StubBackend { config: None });

        flow.load_config().await;
        assert_eq!(flow.deployment_cost().await, 0.5);
        assert!(flow.receiver_address().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_payment_rejects_when_disconnected_without_network() {
        let flow = flow_with_backend(StubBackend { config: None });

        // NeverChain panics on any call past the balance query, so the
        // pre-flight rejection proves no network round-trip happened.
        let request = PaymentRequest::new("RECEIVER".to_string(), 0.5);
        let result = flow.send_payment(&request).await;
        assert!(matches!(
            result,
            Err(AppError::Payment(PaymentError::WalletNotConnected))
        ));
        assert_eq!(flow.phase(), PaymentPhase::Idle);
    }

    #[tokio::test]
    async fn test_send_payment_rejects_invalid_request() {
        let flow = flow_with_backend(StubBackend { config: None });

        let request = PaymentRequest::new("".to_string(), 0.5);
        assert!(matches!(
            flow.send_payment(&request).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_phase() {
        let flow = flow_with_backend(StubBackend { config: None });
        flow.phase_tx.send_replace(PaymentPhase::Failed);
        flow.reset_phase();
        assert_eq!(flow.phase(), PaymentPhase::Idle);
    }
}
