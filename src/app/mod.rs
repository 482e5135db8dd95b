//! Application layer containing business logic and shared state.

pub mod payment;
pub mod state;
pub mod task;
pub mod wallet;

pub use payment::{CONFIRMATION_ROUNDS, PaymentFlow};
pub use state::AppState;
pub use task::{POLL_INTERVAL, TaskTracker};
pub use wallet::{TransactionSigner, WalletSessionManager};
