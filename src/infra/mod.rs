//! Infrastructure layer implementations.

pub mod algod;
pub mod backend;
pub mod session;

pub use algod::{AlgodChainClient, AlgodConfig};
pub use backend::{BackendConfig, HttpAgentBackend};
pub use session::MemorySessionStore;
