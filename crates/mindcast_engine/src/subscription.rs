use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use mindcast_logging::{mc_debug, mc_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::stream::ProgressSource;
use crate::tracker::{TaskEventSink, TrackerEvent};
use crate::types::{TaskId, TaskStatus};

/// The tracker's single subscription slot.
pub(crate) type Slot = Arc<Mutex<Option<StreamSubscription>>>;

pub(crate) fn lock(slot: &Slot) -> MutexGuard<'_, Option<StreamSubscription>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A live reader of one task's progress stream.
///
/// Closing is idempotent; dropping closes. Once closed, nothing more is
/// delivered for this task.
#[derive(Debug)]
pub struct StreamSubscription {
    task_id: TaskId,
    token: CancellationToken,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StreamSubscription {
    /// Spawns the reader on the current tokio runtime.
    pub(crate) fn open(
        task_id: TaskId,
        source: Arc<dyn ProgressSource>,
        sink: Arc<dyn TaskEventSink>,
        slot: Slot,
        idle_timeout: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let reader = Reader {
            task_id: task_id.clone(),
            token: token.clone(),
            finished: finished.clone(),
            sink,
            slot,
            idle_timeout,
        };
        let handle = tokio::spawn(reader.run(source));
        Self {
            task_id,
            token,
            finished,
            handle: Some(handle),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn close(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// True exactly once per subscription: whoever wins may report the terminal status.
    pub(crate) fn claim_terminal(&self) -> bool {
        !self.finished.swap(true, Ordering::SeqCst)
    }

    /// Closes from inside the reader without aborting it.
    fn release(mut self) {
        self.token.cancel();
        self.handle.take();
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

struct Reader {
    task_id: TaskId,
    token: CancellationToken,
    finished: Arc<AtomicBool>,
    sink: Arc<dyn TaskEventSink>,
    slot: Slot,
    idle_timeout: Duration,
}

impl Reader {
    async fn run(self, source: Arc<dyn ProgressSource>) {
        let opened = tokio::select! {
            _ = self.token.cancelled() => return,
            opened = source.open(&self.task_id) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        mc_debug!("Progress stream open for task {}", self.task_id);

        loop {
            let next = tokio::select! {
                _ = self.token.cancelled() => return,
                next = tokio::time::timeout(self.idle_timeout, stream.next()) => next,
            };
            let event = match next {
                Err(_) => return self.fail(StreamError::IdleTimeout(self.idle_timeout)),
                Ok(None) => return self.fail(StreamError::EndedWithoutTerminal),
                Ok(Some(Err(StreamError::Decode(message)))) => {
                    mc_warn!("Skipping progress event for task {}: {message}", self.task_id);
                    continue;
                }
                Ok(Some(Err(err))) => return self.fail(err),
                Ok(Some(Ok(event))) => event,
            };

            let progress = TrackerEvent::Progress {
                task_id: self.task_id.clone(),
                stage: event.stage.clone(),
                detail: event.detail.clone(),
            };
            if event.status.is_terminal() {
                let message = (!event.detail.is_empty()).then(|| event.detail.clone());
                self.finish(Some(progress), event.status, event.result, message);
                return;
            }
            if !self.deliver(progress) {
                return;
            }
        }
    }

    fn is_current(&self, slot: &Option<StreamSubscription>) -> bool {
        slot.as_ref()
            .is_some_and(|current| Arc::ptr_eq(&current.finished, &self.finished))
    }

    fn deliver(&self, event: TrackerEvent) -> bool {
        let slot = lock(&self.slot);
        if !self.is_current(&slot) || self.token.is_cancelled() {
            return false;
        }
        self.sink.emit(event);
        true
    }

    fn fail(&self, err: StreamError) {
        mc_warn!("Progress stream for task {} failed: {err}", self.task_id);
        self.finish(None, TaskStatus::Failed, None, Some(err.to_string()));
    }

    /// Releases the slot, then reports the terminal status if nobody else did.
    fn finish(
        &self,
        progress: Option<TrackerEvent>,
        status: TaskStatus,
        result: Option<crate::types::TaskResult>,
        message: Option<String>,
    ) {
        let mut slot = lock(&self.slot);
        if !self.is_current(&slot) || self.token.is_cancelled() {
            return;
        }
        let Some(subscription) = slot.take() else {
            return;
        };
        let claimed = subscription.claim_terminal();
        subscription.release();
        if !claimed {
            return;
        }
        if let Some(progress) = progress {
            self.sink.emit(progress);
        }
        self.sink.emit(TrackerEvent::Terminal {
            task_id: self.task_id.clone(),
            status,
            result,
            message,
        });
    }
}
