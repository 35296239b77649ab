use crate::model::{EpisodeId, Guest, NewsSnapshot, ScriptDraft, TaskId, WorkflowMode};
use crate::retime::AudioAdjustDraft;

/// Stage shown after the user stops a script preview.
pub const TERMINATED_STAGE: &str = "terminated";
pub const TERMINATED_DETAIL: &str = "Script generation was terminated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseKind {
    #[default]
    Idle,
    NewsReady,
    Generating,
    PreviewRunning,
    ScriptReady,
    Synthesizing,
    PreparingAdjustment,
    AudioAdjustPending,
    RetimeApplying,
    Completed,
}

/// Coarse stage name plus human-readable sub-status of the running task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageProgress {
    pub stage: String,
    pub detail: String,
}

impl StageProgress {
    pub fn terminated() -> Self {
        Self {
            stage: TERMINATED_STAGE.to_string(),
            detail: TERMINATED_DETAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowViewModel {
    pub phase: PhaseKind,
    pub mode: WorkflowMode,
    pub topic_query: String,
    pub news: Option<NewsSnapshot>,
    pub selected_topic: String,
    pub custom_topic: String,
    pub effective_topic: String,
    pub fetching_news: bool,
    pub guests: Vec<Guest>,
    pub selected_guests: Vec<String>,
    pub can_generate: bool,
    pub active_task: Option<TaskId>,
    pub progress: Option<StageProgress>,
    pub script_draft: Option<ScriptDraft>,
    pub audio_adjust: Option<AudioAdjustDraft>,
    pub applying_speeds: bool,
    pub pending_retime: bool,
    /// Episode revealed to the user once the workflow completes.
    pub new_episode: Option<EpisodeId>,
    pub last_error: Option<String>,
    pub dirty: bool,
}
