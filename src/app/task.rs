//! Task lifecycle tracking.
//!
//! One generation task at a time: `create_task` submits the prompt and
//! starts a fixed-cadence poll loop; every poll response replaces the
//! published snapshot wholesale; polling stops exactly once at the
//! first terminal status. A new task supersedes the old one, and the
//! old loop's late responses are fenced out by an epoch counter.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{AgentBackend, AppError, GenerateRequest, Task, TaskStatusResponse};

/// Fixed polling cadence
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tracks the single in-flight generation task
pub struct TaskTracker {
    inner: Arc<TrackerInner>,
    poll_interval: Duration,
}

struct TrackerInner {
    backend: Arc<dyn AgentBackend>,
    task_tx: watch::Sender<Option<Task>>,
    /// Publish epoch. Bumped on every supersede/clear; a poll loop may
    /// only publish while its captured epoch is current, checked under
    /// this lock so a late response can never interleave with a newer
    /// task's snapshots. Handle installation and abort also happen
    /// under this lock, serializing concurrent create/clear calls.
    epoch: Mutex<u64>,
    /// Only locked while `epoch` is held
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskTracker {
    #[must_use]
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self::with_poll_interval(backend, POLL_INTERVAL)
    }

    #[must_use]
    pub fn with_poll_interval(backend: Arc<dyn AgentBackend>, poll_interval: Duration) -> Self {
        let (task_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(TrackerInner {
                backend,
                task_tx,
                epoch: Mutex::new(0),
                poll_handle: Mutex::new(None),
            }),
            poll_interval,
        }
    }

    /// Subscribe to task snapshots; `None` means no task is tracked.
    /// The latest snapshot is replayed to new subscribers.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Task>> {
        self.inner.task_tx.subscribe()
    }

    /// The most recent task snapshot
    #[must_use]
    pub fn current_task(&self) -> Option<Task> {
        self.inner.task_tx.borrow().clone()
    }

    /// Submit a generation prompt and start tracking the resulting task.
    ///
    /// Fails with `SubmissionRejected` when the backend refuses; in that
    /// case any previously tracked task keeps polling undisturbed. On
    /// success the previous task (if any) is superseded: its poll loop
    /// is cancelled immediately and a fresh `Pending` snapshot for the
    /// new task id is published.
    #[instrument(skip(self, prompt))]
    pub async fn create_task(&self, prompt: &str) -> Result<String, AppError> {
        GenerateRequest {
            prompt: prompt.to_string(),
        }
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

        let task_id = self.inner.backend.submit_generation(prompt).await?;
        info!(task_id = %task_id, "Generation task accepted");

        // Bump, publish, spawn, and swap handles as one unit under the
        // epoch lock: an interleaved create or clear must never abort
        // the loop belonging to the current epoch. Nothing in here
        // awaits.
        {
            let mut epoch = self.inner.epoch.lock().unwrap();
            *epoch += 1;
            self.inner
                .task_tx
                .send_replace(Some(Task::pending(task_id.clone(), prompt.to_string())));
            let handle = tokio::spawn(poll_loop(
                Arc::clone(&self.inner),
                task_id.clone(),
                *epoch,
                self.poll_interval,
            ));
            if let Some(old) = self.inner.poll_handle.lock().unwrap().replace(handle) {
                old.abort();
            }
        }

        Ok(task_id)
    }

    /// Stop any active polling and discard the tracked task.
    ///
    /// Callable at any time, including mid-poll; an in-flight late
    /// response is suppressed.
    #[instrument(skip(self))]
    pub fn clear_task(&self) {
        // Same single-unit rule as create_task: the abort must target
        // the handle installed by the epoch being retired, not one a
        // concurrent create installed in between.
        {
            let mut epoch = self.inner.epoch.lock().unwrap();
            *epoch += 1;
            self.inner.task_tx.send_replace(None);
            if let Some(handle) = self.inner.poll_handle.lock().unwrap().take() {
                handle.abort();
            }
        }
        info!("Task cleared");
    }
}

impl TrackerInner {
    /// Publish a poll snapshot if `epoch` is still current.
    /// Returns false when the loop has been superseded.
    fn publish(&self, epoch: u64, snapshot: TaskStatusResponse) -> bool {
        let gate = self.epoch.lock().unwrap();
        if *gate != epoch {
            return false;
        }
        let Some(task) = self.task_tx.borrow().clone() else {
            return false;
        };
        self.task_tx.send_replace(Some(task.with_snapshot(snapshot)));
        true
    }
}

/// Fixed-cadence poll loop with bounded concurrency of one: the next
/// tick is not serviced until the prior response has arrived, so
/// snapshots are published in request order.
async fn poll_loop(inner: Arc<TrackerInner>, task_id: String, epoch: u64, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; polling starts one interval
    // after task creation.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match inner.backend.task_status(&task_id).await {
            Ok(snapshot) => {
                let terminal = snapshot.status.is_terminal();
                if !inner.publish(epoch, snapshot) {
                    // Superseded while the request was in flight
                    return;
                }
                if terminal {
                    info!(task_id = %task_id, "Task reached terminal status, polling stopped");
                    return;
                }
            }
            Err(e) => {
                // Degraded but safe: stop polling, last good snapshot
                // stays visible.
                warn!(task_id = %task_id, error = %e, "Polling transport error, polling stopped");
                return;
            }
        }
    }
}
