use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use futures_util::future::join_all;
use mindcast_logging::{mc_debug, mc_error, mc_warn};
use tokio::task::JoinHandle;

use crate::client::{ApiClient, ApiSettings};
use crate::error::ApiError;
use crate::tracker::{TaskEventSink, TaskTracker, TrackerEvent, DEFAULT_IDLE_TIMEOUT};
use crate::types::{
    EpisodeDetail, EpisodeSummary, Guest, NewsResponse, TaskId, TaskKind, TaskSpec,
};

/// Upper bound on waiting for segment cleanups when the engine shuts down.
pub const CLEANUP_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub stream_idle_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            stream_idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    FetchNews {
        topic: Option<String>,
        max_results: u32,
    },
    LoadGuests,
    SaveGuest {
        guest: Guest,
        is_edit: bool,
    },
    RemoveGuest {
        name: String,
    },
    StartTask(TaskSpec),
    Subscribe {
        task_id: TaskId,
    },
    CancelTask {
        task_id: TaskId,
    },
    DiscardTask {
        task_id: TaskId,
    },
    CloseSubscription,
    FetchEpisode {
        episode_id: String,
    },
    ListEpisodes,
    CleanupSegments {
        episode_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    NewsFetched(Result<NewsResponse, ApiError>),
    GuestsLoaded(Result<Vec<Guest>, ApiError>),
    GuestSaved {
        name: String,
        result: Result<Vec<Guest>, ApiError>,
    },
    GuestRemoved {
        name: String,
        result: Result<Vec<Guest>, ApiError>,
    },
    TaskStarted {
        kind: TaskKind,
        task_id: TaskId,
    },
    TaskStartFailed {
        kind: TaskKind,
        error: ApiError,
    },
    Task(TrackerEvent),
    EpisodeFetched {
        episode_id: String,
        result: Result<EpisodeDetail, ApiError>,
    },
    EpisodesListed(Result<Vec<EpisodeSummary>, ApiError>),
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl TaskEventSink for ChannelEventSink {
    fn emit(&self, event: TrackerEvent) {
        let _ = self.tx.send(EngineEvent::Task(event));
    }
}

/// Runs engine commands on a dedicated thread that owns a tokio runtime.
///
/// Subscription commands are applied in arrival order; REST calls run concurrently.
/// Dropping the handle stops the thread once pending segment cleanups have
/// finished or [`CLEANUP_DRAIN_TIMEOUT`] has passed.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<EngineCommand>>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ApiError> {
        let api = Arc::new(ApiClient::new(&settings.api)?);
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let idle_timeout = settings.stream_idle_timeout;

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    mc_error!("Could not start the engine runtime: {err}");
                    return;
                }
            };
            let _guard = runtime.enter();
            let tracker = TaskTracker::new(
                api.clone(),
                Arc::new(api.progress_source()),
                Arc::new(ChannelEventSink::new(event_tx.clone())),
                idle_timeout,
            );
            let mut cleanups: Vec<JoinHandle<()>> = Vec::new();
            while let Ok(command) = cmd_rx.recv() {
                cleanups.retain(|cleanup| !cleanup.is_finished());
                if let Some(cleanup) = handle_command(&api, &tracker, command, &event_tx) {
                    cleanups.push(cleanup);
                }
            }
            tracker.close();
            drain_cleanups(&runtime, cleanups);
        });

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            worker: Some(worker),
        })
    }

    pub fn send(&self, command: EngineCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(command);
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                mc_error!("Engine thread panicked");
            }
        }
    }
}

fn drain_cleanups(runtime: &tokio::runtime::Runtime, cleanups: Vec<JoinHandle<()>>) {
    let pending: Vec<_> = cleanups
        .into_iter()
        .filter(|cleanup| !cleanup.is_finished())
        .collect();
    if pending.is_empty() {
        return;
    }
    mc_debug!("Waiting for {} segment cleanup(s)", pending.len());
    let drained = runtime.block_on(tokio::time::timeout(
        CLEANUP_DRAIN_TIMEOUT,
        join_all(pending),
    ));
    if drained.is_err() {
        mc_warn!(
            "Segment cleanup still running after {}s; abandoning it",
            CLEANUP_DRAIN_TIMEOUT.as_secs()
        );
    }
}

/// Must run inside the engine runtime's context. Returns the cleanup task a
/// `CleanupSegments` command spawned.
fn handle_command(
    api: &Arc<ApiClient>,
    tracker: &TaskTracker,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) -> Option<JoinHandle<()>> {
    let api = api.clone();
    let tx = event_tx.clone();
    match command {
        EngineCommand::Subscribe { task_id } => tracker.subscribe(task_id),
        EngineCommand::CancelTask { task_id } => tracker.cancel(&task_id),
        EngineCommand::DiscardTask { task_id } => tracker.discard(&task_id),
        EngineCommand::CloseSubscription => tracker.close(),
        EngineCommand::CleanupSegments { episode_id } => {
            return Some(spawn_segment_cleanup(api, episode_id));
        }
        EngineCommand::StartTask(spec) => {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let kind = spec.kind();
                let event = match tracker.start(&spec).await {
                    Ok(task_id) => EngineEvent::TaskStarted { kind, task_id },
                    Err(error) => {
                        mc_warn!("Could not start {kind:?} task: {error}");
                        EngineEvent::TaskStartFailed { kind, error }
                    }
                };
                let _ = tx.send(event);
            });
        }
        EngineCommand::FetchNews { topic, max_results } => {
            tokio::spawn(async move {
                let result = api.fetch_news(topic.as_deref(), max_results).await;
                let _ = tx.send(EngineEvent::NewsFetched(result));
            });
        }
        EngineCommand::LoadGuests => {
            tokio::spawn(async move {
                let _ = tx.send(EngineEvent::GuestsLoaded(api.list_guests().await));
            });
        }
        EngineCommand::SaveGuest { guest, is_edit } => {
            tokio::spawn(async move {
                let result = api.save_guest(&guest, is_edit).await;
                let _ = tx.send(EngineEvent::GuestSaved {
                    name: guest.name,
                    result,
                });
            });
        }
        EngineCommand::RemoveGuest { name } => {
            tokio::spawn(async move {
                let result = api.delete_guest(&name).await;
                let _ = tx.send(EngineEvent::GuestRemoved { name, result });
            });
        }
        EngineCommand::FetchEpisode { episode_id } => {
            tokio::spawn(async move {
                let result = api.fetch_episode(&episode_id).await;
                let _ = tx.send(EngineEvent::EpisodeFetched { episode_id, result });
            });
        }
        EngineCommand::ListEpisodes => {
            tokio::spawn(async move {
                let _ = tx.send(EngineEvent::EpisodesListed(api.list_episodes().await));
            });
        }
    }
    None
}

/// Removes transient per-line audio in the background; failures are only logged.
pub fn spawn_segment_cleanup(api: Arc<ApiClient>, episode_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = api.cleanup_segments(&episode_id).await {
            mc_warn!("Segment cleanup for episode {episode_id} failed: {err}");
        }
    })
}
