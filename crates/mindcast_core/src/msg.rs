use crate::model::{
    EpisodeDetail, EpisodeId, Guest, NewsSnapshot, TaskId, TaskKind, TaskResult, TaskStatus,
    WorkflowMode,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the news search box.
    TopicQueryChanged(String),
    /// User asked for a fresh news snapshot.
    FetchNewsClicked,
    NewsFetched(Result<NewsSnapshot, String>),
    /// User picked one of the news titles as the topic.
    TopicSelected(String),
    /// User typed a free-form topic; overrides the selected one while non-empty.
    CustomTopicChanged(String),
    LoadGuestsRequested,
    GuestsLoaded(Result<Vec<Guest>, String>),
    GuestToggled(String),
    SaveGuestRequested {
        guest: Guest,
        is_edit: bool,
    },
    GuestSaved {
        name: String,
        result: Result<Vec<Guest>, String>,
    },
    RemoveGuestRequested(String),
    GuestRemoved {
        name: String,
        result: Result<Vec<Guest>, String>,
    },
    WorkflowModeChanged(WorkflowMode),
    /// One-click generation.
    GenerateClicked,
    /// Step-by-step: generate a script preview.
    PreviewClicked,
    CancelPreviewClicked,
    /// User edited one line of the script draft.
    DraftLineEdited {
        index: usize,
        text: String,
    },
    ConfirmSynthesisClicked,
    SegmentSpeedChanged {
        index: usize,
        rate: f64,
    },
    ApplySpeedsClicked,
    SkipSpeedAdjustClicked,
    /// Backend accepted a task start request.
    TaskStarted {
        kind: TaskKind,
        task_id: TaskId,
    },
    /// A task start request could not be completed.
    TaskStartFailed {
        kind: TaskKind,
        message: String,
    },
    /// Any message received on a task's progress stream.
    TaskProgress {
        task_id: TaskId,
        stage: String,
        detail: String,
    },
    /// Terminal status of a task; the stream is already closed.
    TaskFinished {
        task_id: TaskId,
        status: TaskStatus,
        result: Option<TaskResult>,
        message: Option<String>,
    },
    /// Completion signal delivered from outside the progress stream.
    GenerateCompleted {
        episode_id: Option<EpisodeId>,
    },
    EpisodeFetched {
        episode_id: EpisodeId,
        result: Result<EpisodeDetail, String>,
    },
    /// User closed the revealed episode.
    EpisodeDismissed,
    ResetWizard,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
