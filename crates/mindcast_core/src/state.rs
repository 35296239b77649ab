use crate::model::{
    EpisodeId, Guest, NewsSnapshot, ScriptDraft, TaskId, TaskKind, WorkflowMode, MAX_GUESTS,
};
use crate::retime::AudioAdjustDraft;
use crate::view_model::{PhaseKind, StageProgress, WorkflowViewModel};

/// Number of news items requested when nothing else is configured.
pub const DEFAULT_NEWS_RESULTS: u32 = 10;

/// Where the wizard currently is. A `task_id` of `None` means the start
/// request has been sent but the backend has not answered yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    NewsReady,
    Generating {
        task_id: Option<TaskId>,
    },
    PreviewRunning {
        task_id: Option<TaskId>,
    },
    ScriptReady,
    Synthesizing {
        task_id: Option<TaskId>,
    },
    PreparingAdjustment {
        episode_id: EpisodeId,
    },
    AudioAdjustPending {
        draft: AudioAdjustDraft,
        applying: bool,
    },
    /// The next completion belongs to the retime task, not the first synthesis.
    RetimeApplying {
        task_id: TaskId,
        draft: AudioAdjustDraft,
    },
    Completed {
        episode_id: EpisodeId,
    },
}

impl WorkflowPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            WorkflowPhase::Idle => PhaseKind::Idle,
            WorkflowPhase::NewsReady => PhaseKind::NewsReady,
            WorkflowPhase::Generating { .. } => PhaseKind::Generating,
            WorkflowPhase::PreviewRunning { .. } => PhaseKind::PreviewRunning,
            WorkflowPhase::ScriptReady => PhaseKind::ScriptReady,
            WorkflowPhase::Synthesizing { .. } => PhaseKind::Synthesizing,
            WorkflowPhase::PreparingAdjustment { .. } => PhaseKind::PreparingAdjustment,
            WorkflowPhase::AudioAdjustPending { .. } => PhaseKind::AudioAdjustPending,
            WorkflowPhase::RetimeApplying { .. } => PhaseKind::RetimeApplying,
            WorkflowPhase::Completed { .. } => PhaseKind::Completed,
        }
    }

    /// No backend work is outstanding and a new stage may be started.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            WorkflowPhase::Idle
                | WorkflowPhase::NewsReady
                | WorkflowPhase::ScriptReady
                | WorkflowPhase::Completed { .. }
        )
    }

    /// The task this phase is waiting on, if its id is known.
    pub fn outstanding_task(&self) -> Option<(TaskKind, &TaskId)> {
        match self {
            WorkflowPhase::Generating { task_id: Some(id) } => Some((TaskKind::Generate, id)),
            WorkflowPhase::PreviewRunning { task_id: Some(id) } => Some((TaskKind::Preview, id)),
            WorkflowPhase::Synthesizing { task_id: Some(id) } => Some((TaskKind::Synthesize, id)),
            WorkflowPhase::RetimeApplying { task_id, .. } => Some((TaskKind::Retime, task_id)),
            _ => None,
        }
    }

    pub fn is_pending_retime(&self) -> bool {
        matches!(self, WorkflowPhase::RetimeApplying { .. })
    }
}

/// Owned workflow context. One instance per wizard; the UI layer holds it and
/// threads it through [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    pub(crate) phase: WorkflowPhase,
    pub(crate) mode: WorkflowMode,
    pub(crate) topic_query: String,
    pub(crate) news: Option<NewsSnapshot>,
    pub(crate) selected_topic: String,
    pub(crate) custom_topic: String,
    pub(crate) fetching_news: bool,
    pub(crate) max_news_results: u32,
    pub(crate) guests: Vec<Guest>,
    pub(crate) selected_guests: Vec<String>,
    pub(crate) script_draft: Option<ScriptDraft>,
    pub(crate) progress: Option<StageProgress>,
    pub(crate) last_error: Option<String>,
    dirty: bool,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            mode: WorkflowMode::default(),
            topic_query: String::new(),
            news: None,
            selected_topic: String::new(),
            custom_topic: String::new(),
            fetching_news: false,
            max_news_results: DEFAULT_NEWS_RESULTS,
            guests: Vec::new(),
            selected_guests: Vec::new(),
            script_draft: None,
            progress: None,
            last_error: None,
            dirty: false,
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mode: WorkflowMode, max_news_results: u32) -> Self {
        Self {
            mode,
            max_news_results: max_news_results.max(1),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> &WorkflowPhase {
        &self.phase
    }

    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    /// Custom topic overrides the selected one.
    pub fn effective_topic(&self) -> &str {
        if self.custom_topic.is_empty() {
            &self.selected_topic
        } else {
            &self.custom_topic
        }
    }

    pub fn has_news(&self) -> bool {
        self.news.is_some()
    }

    pub fn has_script_draft(&self) -> bool {
        self.script_draft
            .as_ref()
            .is_some_and(ScriptDraft::has_dialogue)
    }

    pub fn can_generate(&self) -> bool {
        self.has_news()
            && !self.effective_topic().trim().is_empty()
            && !self.selected_guests.is_empty()
    }

    pub fn selected_guests(&self) -> &[String] {
        &self.selected_guests
    }

    pub fn script_draft(&self) -> Option<&ScriptDraft> {
        self.script_draft.as_ref()
    }

    pub fn audio_adjust(&self) -> Option<&AudioAdjustDraft> {
        match &self.phase {
            WorkflowPhase::AudioAdjustPending { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn view(&self) -> WorkflowViewModel {
        let (audio_adjust, applying_speeds) = match &self.phase {
            WorkflowPhase::AudioAdjustPending { draft, applying } => {
                (Some(draft.clone()), *applying)
            }
            _ => (None, false),
        };
        let new_episode = match &self.phase {
            WorkflowPhase::Completed { episode_id } => Some(episode_id.clone()),
            _ => None,
        };
        WorkflowViewModel {
            phase: self.phase.kind(),
            mode: self.mode,
            topic_query: self.topic_query.clone(),
            news: self.news.clone(),
            selected_topic: self.selected_topic.clone(),
            custom_topic: self.custom_topic.clone(),
            effective_topic: self.effective_topic().to_string(),
            fetching_news: self.fetching_news,
            guests: self.guests.clone(),
            selected_guests: self.selected_guests.clone(),
            can_generate: self.can_generate(),
            active_task: self.phase.outstanding_task().map(|(_, id)| id.clone()),
            progress: self.progress.clone(),
            script_draft: self.script_draft.clone(),
            audio_adjust,
            applying_speeds,
            pending_retime: self.phase.is_pending_retime(),
            new_episode,
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Phase to return to once nothing is outstanding.
    pub(crate) fn settled_phase(&self) -> WorkflowPhase {
        if self.has_script_draft() {
            WorkflowPhase::ScriptReady
        } else if self.has_news() {
            WorkflowPhase::NewsReady
        } else {
            WorkflowPhase::Idle
        }
    }

    /// Adds the guest if there is room, removes it if already selected.
    pub(crate) fn toggle_guest(&mut self, name: &str) {
        if let Some(idx) = self.selected_guests.iter().position(|g| g == name) {
            self.selected_guests.remove(idx);
        } else if self.selected_guests.len() < MAX_GUESTS {
            self.selected_guests.push(name.to_string());
        }
    }

    /// Fresh wizard that keeps the guest catalog, the selection and the mode.
    pub(crate) fn reset(&mut self) {
        let guests = std::mem::take(&mut self.guests);
        let selected_guests = std::mem::take(&mut self.selected_guests);
        *self = Self {
            guests,
            selected_guests,
            ..Self::with_settings(self.mode, self.max_news_results)
        };
    }
}
