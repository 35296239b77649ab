//! MindCast core: pure workflow state machine and view-model helpers.
mod effect;
mod model;
mod msg;
mod retime;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use model::{
    DialogueLine, EpisodeDetail, EpisodeId, EpisodeLine, Guest, NewsItem, NewsSnapshot,
    ResultLine, ScriptDraft, TaskId, TaskKind, TaskRequest, TaskResult, TaskStatus, WorkflowMode,
    DEFAULT_EMOTION, MAX_GUESTS,
};
pub use msg::Msg;
pub use retime::{
    clamp_speech_rate, AdjustLine, AudioAdjustDraft, DEFAULT_SPEECH_RATE, MAX_SPEECH_RATE,
    MIN_SPEECH_RATE,
};
pub use state::{WorkflowPhase, WorkflowState, DEFAULT_NEWS_RESULTS};
pub use update::update;
pub use view_model::{
    PhaseKind, StageProgress, WorkflowViewModel, TERMINATED_DETAIL, TERMINATED_STAGE,
};
