//! Wallet session management.
//!
//! Owns the single active wallet connection. Session snapshots are
//! published through a `watch` channel: the latest snapshot is replayed
//! to new subscribers, and every state change (connect, disconnect,
//! balance refresh) pushes a fresh snapshot.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{info, instrument, warn};

use crate::domain::{
    AppError, ChainClient, ProviderError, SessionStore, SignedTransaction, UnsignedTransaction,
    WalletError, WalletProvider, WalletProviderDescriptor, WalletSession,
};

/// Owns the active wallet session and the fixed provider set.
///
/// Operations are serialized through an internal lock: no overlapping
/// connects, no concurrent balance refreshes.
pub struct WalletSessionManager {
    chain: Arc<dyn ChainClient>,
    session_store: Arc<dyn SessionStore>,
    providers: Vec<Arc<dyn WalletProvider>>,
    active: Mutex<Option<Arc<dyn WalletProvider>>>,
    session_tx: watch::Sender<WalletSession>,
}

impl WalletSessionManager {
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        session_store: Arc<dyn SessionStore>,
        providers: Vec<Arc<dyn WalletProvider>>,
    ) -> Self {
        let (session_tx, _) = watch::channel(WalletSession::disconnected());
        Self {
            chain,
            session_store,
            providers,
            active: Mutex::new(None),
            session_tx,
        }
    }

    /// Subscribe to session snapshots; the current snapshot is
    /// available immediately on the receiver.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.session_tx.subscribe()
    }

    /// The most recent session snapshot
    #[must_use]
    pub fn current(&self) -> WalletSession {
        self.session_tx.borrow().clone()
    }

    /// Descriptors for the configured providers, `is_active` reflecting
    /// the current session.
    pub async fn providers(&self) -> Vec<WalletProviderDescriptor> {
        let active = self.active.lock().await;
        let active_id = active.as_ref().map(|p| p.id().to_string());
        self.providers
            .iter()
            .map(|p| WalletProviderDescriptor {
                id: p.id().to_string(),
                display_name: p.display_name().to_string(),
                icon_ref: p.icon_ref().to_string(),
                is_active: active_id.as_deref() == Some(p.id()),
            })
            .collect()
    }

    /// Connect to the provider with the given id and activate its first
    /// account.
    #[instrument(skip(self))]
    pub async fn connect(&self, provider_id: &str) -> Result<(), AppError> {
        let mut active = self.active.lock().await;

        let provider = self
            .providers
            .iter()
            .find(|p| p.id() == provider_id)
            .cloned()
            .ok_or_else(|| WalletError::ProviderNotFound(provider_id.to_string()))?;

        let accounts = provider.connect().await.map_err(|e| {
            warn!(provider = %provider_id, error = %e, "Provider connect failed");
            map_provider_error(e)
        })?;

        let address = accounts.into_iter().next().ok_or_else(|| {
            WalletError::ProviderUnavailable("provider returned no accounts".to_string())
        })?;

        // Balance fetch is best-effort: a node hiccup must not fail the
        // connect, the session starts at zero and refreshes later.
        let balance_micro = match self.chain.account_balance(&address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(address = %address, error = %e, "Balance query failed on connect");
                0
            }
        };

        self.session_store.save(provider_id);
        *active = Some(provider);
        self.session_tx
            .send_replace(WalletSession::connected(address, balance_micro));

        info!(provider = %provider_id, "Wallet connected");
        Ok(())
    }

    /// Disconnect the active session.
    ///
    /// Best-effort: the session always resets to disconnected, even when
    /// the underlying provider disconnect fails.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        let mut active = self.active.lock().await;

        match active.take() {
            Some(provider) => {
                if let Err(e) = provider.disconnect().await {
                    warn!(provider = %provider.id(), error = %e, "Provider disconnect failed");
                }
            }
            None => self.session_store.clear(),
        }

        self.session_tx.send_replace(WalletSession::disconnected());
        info!("Wallet disconnected");
    }

    /// Re-query the active account's balance and republish the session.
    ///
    /// No-op when disconnected. Never surfaces an error: a failed query
    /// is logged and the prior balance stays visible.
    #[instrument(skip(self))]
    pub async fn refresh_balance(&self) {
        let _active = self.active.lock().await;

        let current = self.session_tx.borrow().clone();
        let Some(address) = current.address.clone() else {
            return;
        };

        match self.chain.account_balance(&address).await {
            Ok(balance_micro) => {
                self.session_tx
                    .send_replace(WalletSession::connected(address, balance_micro));
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Balance refresh failed, keeping prior balance");
            }
        }
    }

    /// A signing capability bound to the active provider
    pub async fn transaction_signer(&self) -> Result<TransactionSigner, AppError> {
        let active = self.active.lock().await;
        let provider = active.as_ref().ok_or(WalletError::NoActiveWallet)?;
        Ok(TransactionSigner {
            provider: Arc::clone(provider),
        })
    }
}

/// Signs transactions through whichever provider was active when the
/// capability was obtained.
pub struct TransactionSigner {
    provider: Arc<dyn WalletProvider>,
}

impl TransactionSigner {
    /// Sign the transactions at `indices_to_sign`; entries the provider
    /// declines come back as `None`.
    pub async fn sign(
        &self,
        transactions: &[UnsignedTransaction],
        indices_to_sign: &[usize],
    ) -> Result<Vec<Option<SignedTransaction>>, AppError> {
        self.provider
            .sign_transactions(transactions, indices_to_sign)
            .await
            .map_err(map_provider_error)
    }
}

fn map_provider_error(error: ProviderError) -> AppError {
    match error {
        ProviderError::Rejected(msg) => WalletError::ConnectionRejected(msg).into(),
        ProviderError::Other(msg) => WalletError::ProviderUnavailable(msg).into(),
    }
}

/// Shorten an address for display: `ABCDEF...WXYZ`
#[must_use]
pub fn format_address(address: Option<&str>) -> String {
    match address {
        Some(addr) if addr.len() > 10 => {
            format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
        }
        Some(addr) => addr.to_string(),
        None => String::new(),
    }
}
