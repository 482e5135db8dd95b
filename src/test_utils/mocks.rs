//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AgentBackend, AppError, BackendError, ChainClient, ChainError, PaymentConfig,
    PaymentVerification, ProviderError, SignedTransaction, SuggestedParams, TaskStatusResponse,
    UnsignedTransaction, WalletProvider,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "Mock error".to_string())
    }
}

/// How the mock wallet responds to signing requests
#[derive(Debug, Clone)]
pub enum SignBehavior {
    /// Return signed bytes for every requested index
    Sign,
    /// Return `None` for every entry (user declined in the wallet UI)
    Decline,
    /// Return an empty vector
    Empty,
    /// Fail the whole signing request
    Fail(String),
}

/// Mock wallet provider for testing
pub struct MockWalletProvider {
    id: String,
    accounts: Vec<String>,
    connect_config: MockConfig,
    sign_behavior: Mutex<SignBehavior>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
}

impl MockWalletProvider {
    #[must_use]
    pub fn new(id: impl Into<String>, accounts: Vec<String>) -> Self {
        Self {
            id: id.into(),
            accounts,
            connect_config: MockConfig::success(),
            sign_behavior: Mutex::new(SignBehavior::Sign),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose `connect` is rejected by the user
    #[must_use]
    pub fn rejecting(id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut provider = Self::new(id, vec![]);
        provider.connect_config = MockConfig::failure(message);
        provider
    }

    pub fn set_sign_behavior(&self, behavior: SignBehavior) {
        *self.sign_behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&self) -> Result<Vec<String>, ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::Relaxed);
        if self.connect_config.should_fail {
            return Err(ProviderError::Rejected(self.connect_config.message()));
        }
        Ok(self.accounts.clone())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn sign_transactions(
        &self,
        transactions: &[UnsignedTransaction],
        indices_to_sign: &[usize],
    ) -> Result<Vec<Option<SignedTransaction>>, ProviderError> {
        self.sign_calls.fetch_add(1, Ordering::Relaxed);
        let behavior = self.sign_behavior.lock().unwrap().clone();
        match behavior {
            SignBehavior::Sign => Ok(transactions
                .iter()
                .enumerate()
                .map(|(i, txn)| {
                    indices_to_sign
                        .contains(&i)
                        .then(|| SignedTransaction(txn.note.clone()))
                })
                .collect()),
            SignBehavior::Decline => Ok(transactions.iter().map(|_| None).collect()),
            SignBehavior::Empty => Ok(vec![]),
            SignBehavior::Fail(msg) => Err(ProviderError::Rejected(msg)),
        }
    }
}

/// Mock chain client for testing
pub struct MockChainClient {
    config: MockConfig,
    balance_micro: AtomicU64,
    confirmed_round: AtomicU64,
    confirm_error: Mutex<Option<String>>,
    pub params_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
}

impl MockChainClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            balance_micro: AtomicU64::new(10_000_000),
            confirmed_round: AtomicU64::new(1042),
            confirm_error: Mutex::new(None),
            params_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_balance(&self, micro: u64) {
        self.balance_micro.store(micro, Ordering::Relaxed);
    }

    /// Make `wait_for_confirmation` fail with the given message while
    /// every other operation keeps succeeding.
    pub fn set_confirm_error(&self, message: impl Into<String>) {
        *self.confirm_error.lock().unwrap() = Some(message.into());
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Chain(ChainError::Unavailable(
                self.config.message(),
            )));
        }
        Ok(())
    }
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn health_check(&self) -> Result<(), AppError> {
        self.check_should_fail()
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, AppError> {
        self.params_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;
        Ok(SuggestedParams {
            fee: 0,
            min_fee: 1000,
            first_round: 1000,
            last_round: 2000,
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=".to_string(),
        })
    }

    async fn submit_raw(&self, _signed: &SignedTransaction) -> Result<String, AppError> {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;
        Ok(format!("MOCKTX{}", Uuid::new_v4().simple()))
    }

    async fn wait_for_confirmation(&self, _tx_id: &str, _max_rounds: u64) -> Result<u64, AppError> {
        self.confirm_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;
        if let Some(message) = self.confirm_error.lock().unwrap().clone() {
            return Err(AppError::Chain(ChainError::Unavailable(message)));
        }
        Ok(self.confirmed_round.load(Ordering::Relaxed))
    }

    async fn account_balance(&self, _address: &str) -> Result<u64, AppError> {
        self.balance_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;
        Ok(self.balance_micro.load(Ordering::Relaxed))
    }
}

/// Mock agent backend for testing.
///
/// Status responses are served from a queue; when the queue empties the
/// last served snapshot is repeated, so a poll loop keeps seeing a
/// stable view.
pub struct MockAgentBackend {
    config: MockConfig,
    task_id: Mutex<Option<String>>,
    status_queue: Mutex<VecDeque<Result<TaskStatusResponse, String>>>,
    last_status: Mutex<Option<TaskStatusResponse>>,
    payment_config: Mutex<PaymentConfig>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub config_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
}

impl MockAgentBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            task_id: Mutex::new(None),
            status_queue: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            payment_config: Mutex::new(PaymentConfig {
                receiver_address: "RECEIVER".to_string(),
                deployment_cost: 0.5,
            }),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            config_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Fix the task id returned by `submit_generation`
    pub fn set_task_id(&self, task_id: impl Into<String>) {
        *self.task_id.lock().unwrap() = Some(task_id.into());
    }

    pub fn set_payment_config(&self, config: PaymentConfig) {
        *self.payment_config.lock().unwrap() = config;
    }

    /// Queue a status snapshot to serve on a future poll
    pub fn push_status(&self, status: TaskStatusResponse) {
        self.status_queue.lock().unwrap().push_back(Ok(status));
    }

    /// Queue a transport failure to serve on a future poll
    pub fn push_status_error(&self, message: impl Into<String>) {
        self.status_queue
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
    }
}

impl Default for MockAgentBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentBackend for MockAgentBackend {
    async fn submit_generation(&self, _prompt: &str) -> Result<String, AppError> {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        if self.config.should_fail {
            return Err(AppError::Backend(BackendError::SubmissionRejected(
                self.config.message(),
            )));
        }
        let preset = self.task_id.lock().unwrap().clone();
        Ok(preset.unwrap_or_else(|| Uuid::new_v4().to_string()))
    }

    async fn task_status(&self, _task_id: &str) -> Result<TaskStatusResponse, AppError> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        let next = self.status_queue.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last_status.lock().unwrap() = Some(status.clone());
                Ok(status)
            }
            Some(Err(message)) => {
                Err(AppError::Backend(BackendError::PollingTransport(message)))
            }
            None => {
                let last = self.last_status.lock().unwrap().clone();
                Ok(last.unwrap_or_else(|| TaskStatusResponse {
                    status: Default::default(),
                    logs: vec![],
                    result: None,
                    error: None,
                }))
            }
        }
    }

    async fn payment_config(&self) -> Result<PaymentConfig, AppError> {
        self.config_calls.fetch_add(1, Ordering::Relaxed);
        if self.config.should_fail {
            return Err(AppError::Backend(BackendError::Transport(
                self.config.message(),
            )));
        }
        Ok(self.payment_config.lock().unwrap().clone())
    }

    async fn verify_payment(
        &self,
        _transaction_id: &str,
        _wallet_address: &str,
    ) -> Result<PaymentVerification, AppError> {
        self.verify_calls.fetch_add(1, Ordering::Relaxed);
        if self.config.should_fail {
            return Err(AppError::Backend(BackendError::Transport(
                self.config.message(),
            )));
        }
        let config = self.payment_config.lock().unwrap().clone();
        Ok(PaymentVerification {
            verified: true,
            amount: config.deployment_cost,
            message: Some("Payment verified".to_string()),
        })
    }

    async fn health(&self) -> Result<serde_json::Value, AppError> {
        if self.config.should_fail {
            return Err(AppError::Backend(BackendError::Transport(
                self.config.message(),
            )));
        }
        Ok(serde_json::json!({ "status": "ok" }))
    }
}
