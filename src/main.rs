//! Headless driver: submits a generation prompt and streams task
//! status until the backend reports a terminal state.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use algorand_agent_client::app::AppState;
use algorand_agent_client::domain::TaskStatus;
use algorand_agent_client::infra::{
    AlgodChainClient, AlgodConfig, BackendConfig, HttpAgentBackend, MemorySessionStore,
};

/// Application configuration
struct Config {
    algod_url: String,
    algod_token: SecretString,
    backend_url: String,
    poll_interval_ms: u64,
}

impl Config {
    fn from_env() -> Result<Self> {
        let algod_url = env::var("ALGOD_URL")
            .unwrap_or_else(|_| "https://testnet-api.algonode.cloud".to_string());
        let algod_token = SecretString::from(env::var("ALGOD_TOKEN").unwrap_or_default());
        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let poll_interval_ms = env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1_000);

        Ok(Self {
            algod_url,
            algod_token,
            backend_url,
            poll_interval_ms,
        })
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let prompt = env::args()
        .nth(1)
        .context("usage: algorand-agent-client <prompt>")?;

    let chain = Arc::new(AlgodChainClient::new(AlgodConfig::new(
        config.algod_url.clone(),
        config.algod_token.clone(),
    )));
    let backend = Arc::new(HttpAgentBackend::new(BackendConfig::new(
        config.backend_url.clone(),
    )));
    let state = AppState::new(
        chain,
        backend,
        Arc::new(MemorySessionStore::new()),
        vec![],
    )
    .with_poll_interval(std::time::Duration::from_millis(config.poll_interval_ms));

    if let Err(e) = state.chain.health_check().await {
        warn!(error = %e, url = %config.algod_url, "Algod node unreachable");
    }
    state
        .backend
        .health()
        .await
        .context("Agent backend unreachable")?;

    state.payment.load_config().await;
    let cost_algos = state.payment.deployment_cost().await;
    info!(cost_algos, "Payment configuration loaded");

    let task_id = state.tasks.create_task(&prompt).await?;
    info!(task_id = %task_id, "Tracking generation task");

    let mut snapshots = state.tasks.subscribe();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(task) = snapshots.borrow_and_update().clone() else {
                    continue;
                };
                info!(status = %task.status, logs = task.logs.len(), "Task update");
                for line in &task.logs {
                    println!("  {line}");
                }
                match task.status {
                    TaskStatus::Completed => {
                        if let Some(result) = &task.result {
                            info!(app_id = %result.app_id, "Contract deployed");
                            println!("{}", serde_json::to_string_pretty(result)?);
                        }
                        break;
                    }
                    TaskStatus::Failed => {
                        anyhow::bail!(
                            "generation failed: {}",
                            task.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    _ => {}
                }
            }
            _ = signal::ctrl_c() => {
                info!("Interrupted, clearing task");
                state.tasks.clear_task();
                break;
            }
        }
    }

    Ok(())
}
