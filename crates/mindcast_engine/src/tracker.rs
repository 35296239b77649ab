//! Lifecycle of backend tasks: start, observe, cancel.
//!
//! At most one progress subscription is live at a time. Every event a
//! subscription delivers carries its task id, and the terminal event of a
//! subscription is delivered at most once, whether the stream, a failure, or a
//! local cancel produced it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mindcast_logging::{mc_debug, mc_info, mc_warn};

use crate::client::TaskBackend;
use crate::error::ApiError;
use crate::stream::ProgressSource;
use crate::subscription::{lock, Slot, StreamSubscription};
use crate::types::{TaskId, TaskResult, TaskSpec, TaskStatus};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Progress {
        task_id: TaskId,
        stage: String,
        detail: String,
    },
    Terminal {
        task_id: TaskId,
        status: TaskStatus,
        result: Option<TaskResult>,
        message: Option<String>,
    },
}

impl TrackerEvent {
    pub fn task_id(&self) -> &str {
        match self {
            TrackerEvent::Progress { task_id, .. } | TrackerEvent::Terminal { task_id, .. } => {
                task_id
            }
        }
    }
}

pub trait TaskEventSink: Send + Sync {
    fn emit(&self, event: TrackerEvent);
}

#[derive(Clone)]
pub struct TaskTracker {
    backend: Arc<dyn TaskBackend>,
    source: Arc<dyn ProgressSource>,
    sink: Arc<dyn TaskEventSink>,
    slot: Slot,
    idle_timeout: Duration,
}

impl TaskTracker {
    pub fn new(
        backend: Arc<dyn TaskBackend>,
        source: Arc<dyn ProgressSource>,
        sink: Arc<dyn TaskEventSink>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            source,
            sink,
            slot: Arc::new(Mutex::new(None)),
            idle_timeout,
        }
    }

    pub async fn start(&self, spec: &TaskSpec) -> Result<TaskId, ApiError> {
        self.backend.start_task(spec).await
    }

    /// Opens the progress stream of `task_id`, closing any open one first.
    ///
    /// Must run inside a tokio runtime.
    pub fn subscribe(&self, task_id: TaskId) {
        let mut slot = lock(&self.slot);
        if let Some(mut previous) = slot.take() {
            mc_debug!(
                "Closing subscription to task {} before subscribing to {task_id}",
                previous.task_id()
            );
            previous.close();
        }
        mc_info!("Subscribing to progress of task {task_id}");
        *slot = Some(StreamSubscription::open(
            task_id,
            self.source.clone(),
            self.sink.clone(),
            self.slot.clone(),
            self.idle_timeout,
        ));
    }

    /// Tears down the live subscription of `task_id` and reports it cancelled,
    /// then asks the backend to stop the task without waiting for the answer.
    ///
    /// A no-op unless `task_id` is the task being observed.
    pub fn cancel(&self, task_id: &str) {
        {
            let mut slot = lock(&self.slot);
            let observed = slot
                .as_ref()
                .is_some_and(|subscription| subscription.task_id() == task_id);
            if !observed {
                mc_debug!("Ignoring cancel for task {task_id}: not observed");
                return;
            }
            let Some(mut subscription) = slot.take() else {
                return;
            };
            subscription.close();
            if subscription.claim_terminal() {
                self.sink.emit(TrackerEvent::Terminal {
                    task_id: task_id.to_string(),
                    status: TaskStatus::Cancelled,
                    result: None,
                    message: None,
                });
            }
        }
        mc_info!("Cancelled task {task_id}");
        self.request_backend_cancel(task_id);
    }

    /// Best-effort backend cancel for a task nobody observes.
    pub fn discard(&self, task_id: &str) {
        mc_info!("Discarding orphaned task {task_id}");
        self.request_backend_cancel(task_id);
    }

    /// Closes the live subscription, if any. Idempotent.
    pub fn close(&self) {
        if let Some(mut subscription) = lock(&self.slot).take() {
            mc_debug!("Closing subscription to task {}", subscription.task_id());
            subscription.close();
        }
    }

    pub fn active_task(&self) -> Option<TaskId> {
        lock(&self.slot)
            .as_ref()
            .map(|subscription| subscription.task_id().to_string())
    }

    fn request_backend_cancel(&self, task_id: &str) {
        let backend = self.backend.clone();
        let task_id = task_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = backend.cancel_task(&task_id).await {
                mc_warn!("Backend cancel of task {task_id} failed: {err}");
            }
        });
    }
}
