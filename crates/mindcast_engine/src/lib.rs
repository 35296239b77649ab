//! MindCast engine: backend client, progress streams and effect execution.
mod client;
mod engine;
mod error;
mod stream;
mod subscription;
mod tracker;
mod types;

pub use client::{ApiClient, ApiSettings, TaskBackend};
pub use engine::{
    spawn_segment_cleanup, ChannelEventSink, EngineCommand, EngineEvent, EngineHandle,
    EngineSettings, CLEANUP_DRAIN_TIMEOUT,
};
pub use error::{ApiError, StreamError};
pub use stream::{decode_event, EventStream, ProgressSource, SseProgressSource};
pub use subscription::StreamSubscription;
pub use tracker::{TaskEventSink, TaskTracker, TrackerEvent, DEFAULT_IDLE_TIMEOUT};
pub use types::{
    EpisodeDetail, EpisodeLine, EpisodeSummary, Guest, NewsItem, NewsResponse, ResultLine,
    ScriptLine, ScriptPayload, TaskEvent, TaskId, TaskKind, TaskResult, TaskSpec, TaskStatus,
};
