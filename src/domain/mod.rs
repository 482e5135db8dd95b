//! Domain layer containing core types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, BackendError, ChainError, PaymentError, ProviderError, WalletError, classify_failure,
};
pub use traits::{AgentBackend, ChainClient, SessionStore, WalletProvider};
pub use types::{
    GenerateRequest, GenerateResponse, MICRO_PER_ALGO, PAYMENT_NOTE, PaymentConfig, PaymentOutcome,
    PaymentPhase, PaymentRequest, PaymentVerification, SignedTransaction, SuggestedParams, Task,
    TaskResult, TaskStatus, TaskStatusResponse, UnsignedTransaction, VerifyPaymentRequest,
    WalletProviderDescriptor, WalletSession, algos_to_micro, micro_to_algos,
};
