//! Error taxonomy for the client orchestration layer.
//!
//! Every external boundary (wallet provider, chain node, agent backend)
//! surfaces failures as a typed variant here; errors never cross a
//! component boundary as raw transport errors.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors raised by the wallet session manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet provider not found: {0}")]
    ProviderNotFound(String),

    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("no active wallet")]
    NoActiveWallet,
}

/// Errors raised by the payment flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("wallet not connected")]
    WalletNotConnected,

    #[error(
        "insufficient balance: required {required_micro} microAlgos, available {available_micro}"
    )]
    InsufficientBalance {
        required_micro: u64,
        available_micro: u64,
    },

    #[error("transaction signing was cancelled")]
    SigningCancelled,

    #[error("chain confirmation failed: {0}")]
    ChainConfirmationFailed(String),
}

/// Errors surfaced by the chain client adapter.
/// Node errors are passed through without interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain unavailable: {0}")]
    Unavailable(String),

    #[error("chain rejected request: {0}")]
    Rejected(String),
}

/// Errors surfaced by the agent backend adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("polling transport error: {0}")]
    PollingTransport(String),

    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("backend rejected request: {0}")]
    Rejected(String),
}

/// Raw failure reported by a wallet provider, classified by the session
/// manager at its boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The user cancelled or the provider rejected the request
    #[error("rejected: {0}")]
    Rejected(String),

    /// Any other provider-level failure
    #[error("{0}")]
    Other(String),
}

/// Derive a human-readable failure reason from an error message.
///
/// Advisory only: callers must log the raw error before classifying so
/// the underlying cause is never hidden.
#[must_use]
pub fn classify_failure(error: &AppError) -> String {
    let raw = error.to_string();
    let lower = raw.to_lowercase();

    if lower.contains("cancelled") {
        "user cancelled".to_string()
    } else if lower.contains("rejected") {
        "wallet rejected".to_string()
    } else if lower.contains("insufficient") {
        "insufficient balance at submission time".to_string()
    } else {
        raw
    }
}
