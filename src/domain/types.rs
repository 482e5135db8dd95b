//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// MicroAlgos per Algo
pub const MICRO_PER_ALGO: u64 = 1_000_000;

/// Fixed note attached to every deployment payment transaction
pub const PAYMENT_NOTE: &[u8] = b"Smart Contract Deployment Payment";

/// Convert whole Algos to microAlgos, floor-rounded
#[must_use]
pub fn algos_to_micro(algos: f64) -> u64 {
    (algos * MICRO_PER_ALGO as f64).floor() as u64
}

/// Convert microAlgos to whole Algos
#[must_use]
pub fn micro_to_algos(micro: u64) -> f64 {
    micro as f64 / MICRO_PER_ALGO as f64
}

/// The single active wallet session.
///
/// Invariant: `connected == address.is_some()` after every manager
/// operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletSession {
    /// Active account address, if connected
    pub address: Option<String>,
    /// Balance of the active account in microAlgos
    pub balance_micro: u64,
    /// Whether a wallet is currently connected
    pub connected: bool,
}

impl WalletSession {
    /// The initial (and post-disconnect) session state
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            address: None,
            balance_micro: 0,
            connected: false,
        }
    }

    /// A connected session for the given address
    #[must_use]
    pub fn connected(address: String, balance_micro: u64) -> Self {
        Self {
            address: Some(address),
            balance_micro,
            connected: true,
        }
    }

    /// Check the `connected == address.is_some()` invariant
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        self.connected == self.address.is_some()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Descriptor for a configured wallet provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub icon_ref: String,
    /// Whether this provider underlies the current session
    pub is_active: bool,
}

/// Input to the payment flow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Receiver account address
    #[validate(length(min = 1, message = "Receiver address is required"))]
    pub receiver_address: String,
    /// Amount in whole Algos
    #[validate(range(min = 0.000001, message = "Amount must be greater than 0"))]
    pub amount_algos: f64,
}

impl PaymentRequest {
    #[must_use]
    pub fn new(receiver_address: String, amount_algos: f64) -> Self {
        Self {
            receiver_address,
            amount_algos,
        }
    }
}

/// Result of a single payment attempt; immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success { transaction_id: String },
    Failure { reason: String },
}

/// Observable payment flow phase, published for UI progress display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPhase {
    #[default]
    Idle,
    Processing,
    Confirming,
    Succeeded,
    Failed,
}

impl PaymentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Confirming => "confirming",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a tracked generation task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted by the backend, not yet started
    #[default]
    Pending,
    /// The backend job is running
    InProgress,
    /// Terminal: generation and deployment succeeded
    Completed,
    /// Terminal: the job failed
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal statuses stop polling
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Pending and InProgress are collectively "active"
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result attached to a completed task; immutable once set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskResult {
    /// On-chain application id of the deployed contract
    pub app_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_excerpt: Option<String>,
}

/// One backend generation-and-deployment job tracked end-to-end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Opaque id assigned by the backend
    pub id: String,
    pub prompt: String,
    pub status: TaskStatus,
    pub logs: Vec<String>,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A freshly accepted task, before the first poll response
    #[must_use]
    pub fn pending(id: String, prompt: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            prompt,
            status: TaskStatus::Pending,
            logs: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the polled fields wholesale from a status response
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: TaskStatusResponse) -> Self {
        self.status = snapshot.status;
        self.logs = snapshot.logs;
        self.result = snapshot.result;
        self.error = snapshot.error;
        self.updated_at = Utc::now();
        self
    }
}

/// Request body for `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "Prompt is required"))]
    pub prompt: String,
}

/// Response body for `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub task_id: String,
}

/// Response body for `GET /api/status/{task_id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payment configuration served by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentConfig {
    pub receiver_address: String,
    /// Deployment cost in whole Algos
    pub deployment_cost: f64,
}

impl Default for PaymentConfig {
    /// Built-in fallback used when the backend config fetch fails
    fn default() -> Self {
        Self {
            receiver_address: String::new(),
            deployment_cost: 0.5,
        }
    }
}

/// Request body for `POST /api/verify-payment`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub transaction_id: String,
    pub wallet_address: String,
}

/// Response body for `POST /api/verify-payment`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentVerification {
    pub verified: bool,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Suggested transaction parameters from the node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Suggested fee in microAlgos per byte
    pub fee: u64,
    /// Minimum flat fee in microAlgos
    pub min_fee: u64,
    /// First valid round for the transaction
    pub first_round: u64,
    /// Last valid round for the transaction
    pub last_round: u64,
    pub genesis_id: String,
    /// Base64-encoded genesis hash
    pub genesis_hash: String,
}

/// A payment transaction awaiting signature by the wallet provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub sender: String,
    pub receiver: String,
    /// Amount in microAlgos
    pub amount_micro: u64,
    pub note: Vec<u8>,
    pub params: SuggestedParams,
}

impl UnsignedTransaction {
    /// A deployment payment with the fixed descriptive note
    #[must_use]
    pub fn payment(
        sender: String,
        receiver: String,
        amount_micro: u64,
        params: SuggestedParams,
    ) -> Self {
        Self {
            sender,
            receiver,
            amount_micro,
            note: PAYMENT_NOTE.to_vec(),
            params,
        }
    }
}

/// Opaque signed-transaction bytes produced by the provider signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction(pub Vec<u8>);
