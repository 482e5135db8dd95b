//! Application state management.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AgentBackend, ChainClient, PaymentConfig, SessionStore, WalletProvider};

use super::payment::PaymentFlow;
use super::task::TaskTracker;
use super::wallet::WalletSessionManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub wallet: Arc<WalletSessionManager>,
    pub payment: Arc<PaymentFlow>,
    pub tasks: Arc<TaskTracker>,
    pub chain: Arc<dyn ChainClient>,
    pub backend: Arc<dyn AgentBackend>,
}

impl AppState {
    /// Create a new application state
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        backend: Arc<dyn AgentBackend>,
        session_store: Arc<dyn SessionStore>,
        providers: Vec<Arc<dyn WalletProvider>>,
    ) -> Self {
        let wallet = Arc::new(WalletSessionManager::new(
            Arc::clone(&chain),
            session_store,
            providers,
        ));
        let payment = Arc::new(PaymentFlow::new(
            Arc::clone(&wallet),
            Arc::clone(&chain),
            Arc::clone(&backend),
            PaymentConfig::default(),
        ));
        let tasks = Arc::new(TaskTracker::new(Arc::clone(&backend)));
        Self {
            wallet,
            payment,
            tasks,
            chain,
            backend,
        }
    }

    /// Override the task polling cadence (builder pattern)
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.tasks = Arc::new(TaskTracker::with_poll_interval(
            Arc::clone(&self.backend),
            poll_interval,
        ));
        self
    }
}
