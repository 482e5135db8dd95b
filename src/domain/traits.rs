//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::{AppError, ProviderError};
use super::types::{
    PaymentConfig, PaymentVerification, SignedTransaction, SuggestedParams, TaskStatusResponse,
    UnsignedTransaction,
};

/// An external wallet implementation offering connect/sign capabilities.
///
/// Providers are opaque: connecting may involve user interaction in a
/// separate surface (browser extension, QR flow). Failures are reported
/// as [`ProviderError`] and classified by the session manager.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Stable provider identifier
    fn id(&self) -> &str;

    fn display_name(&self) -> &str {
        self.id()
    }

    fn icon_ref(&self) -> &str {
        ""
    }

    /// Establish a session and return the available account addresses
    async fn connect(&self) -> Result<Vec<String>, ProviderError>;

    /// Tear down the provider session
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Sign the transactions at `indices_to_sign` within `transactions`.
    /// Entries the provider declines to sign come back as `None`.
    async fn sign_transactions(
        &self,
        transactions: &[UnsignedTransaction],
        indices_to_sign: &[usize],
    ) -> Result<Vec<Option<SignedTransaction>>, ProviderError>;
}

/// Chain client trait: a thin façade over node RPC.
///
/// Each operation maps 1:1 to a node call; node errors surface as
/// [`ChainError`](super::error::ChainError) variants without
/// interpretation and with no retry beyond the transport's own.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Check node connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Fetch suggested transaction parameters
    async fn suggested_params(&self) -> Result<SuggestedParams, AppError>;

    /// Submit signed transaction bytes; returns the transaction id
    async fn submit_raw(&self, signed: &SignedTransaction) -> Result<String, AppError>;

    /// Wait for the transaction to confirm within `max_rounds` rounds;
    /// returns the confirmed round
    async fn wait_for_confirmation(&self, tx_id: &str, max_rounds: u64) -> Result<u64, AppError>;

    /// Fetch an account's balance in microAlgos
    async fn account_balance(&self, address: &str) -> Result<u64, AppError>;
}

/// Agent backend trait over the generation REST contract
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Submit a generation prompt; returns the backend-assigned task id
    async fn submit_generation(&self, prompt: &str) -> Result<String, AppError>;

    /// Fetch the current status snapshot for a task
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, AppError>;

    /// Fetch the payment configuration
    async fn payment_config(&self) -> Result<PaymentConfig, AppError>;

    /// Ask the backend to verify an on-chain payment (advisory)
    async fn verify_payment(
        &self,
        transaction_id: &str,
        wallet_address: &str,
    ) -> Result<PaymentVerification, AppError>;

    /// Backend liveness; implementations retry once on failure
    async fn health(&self) -> Result<serde_json::Value, AppError>;
}

/// Persisted session marker storage.
///
/// The browser original kept a marker in local storage; disconnect
/// clears it directly when no provider session is active.
pub trait SessionStore: Send + Sync {
    /// Record the provider id of the active session
    fn save(&self, provider_id: &str);

    /// Clear any persisted session marker
    fn clear(&self);

    /// Read the persisted provider id, if any
    fn load(&self) -> Option<String>;
}
