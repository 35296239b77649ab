use crate::model::{EpisodeId, Guest, TaskId, TaskRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
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
    StartTask(TaskRequest),
    /// Open the progress stream, replacing any open one.
    Subscribe {
        task_id: TaskId,
    },
    /// Local teardown of the live subscription plus a best-effort backend cancel.
    CancelTask {
        task_id: TaskId,
    },
    /// Best-effort backend cancel for a task nobody waits for any more.
    DiscardTask {
        task_id: TaskId,
    },
    CloseSubscription,
    FetchEpisode {
        episode_id: EpisodeId,
    },
    /// Fire-and-forget removal of transient per-line audio.
    CleanupSegments {
        episode_id: EpisodeId,
    },
}
