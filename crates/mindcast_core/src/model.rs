/// Opaque identifier of a server-tracked task.
pub type TaskId = String;
/// Opaque identifier of a produced episode.
pub type EpisodeId = String;

/// Upper bound on the number of guests in one episode.
pub const MAX_GUESTS: usize = 3;
/// Emotion assigned to dialogue lines that do not carry one.
pub const DEFAULT_EMOTION: &str = "neutral";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowMode {
    /// A single opaque generation call.
    #[default]
    OneClick,
    /// Preview the script, edit it, synthesize, then adjust line speeds.
    StepByStep,
}

impl WorkflowMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowMode::OneClick => "one-click",
            WorkflowMode::StepByStep => "step-by-step",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "one-click" | "oneclick" => Some(WorkflowMode::OneClick),
            "step-by-step" | "stepbystep" | "steps" => Some(WorkflowMode::StepByStep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub content: String,
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewsSnapshot {
    pub count: usize,
    pub items: Vec<NewsItem>,
}

/// A guest persona from the catalog. Only `name` matters to the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Guest {
    pub name: String,
    pub gender: String,
    pub age: u32,
    pub mbti: String,
    pub personality: String,
    pub occupation: String,
    pub speaking_style: String,
    pub voice_id: String,
    pub background: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
    pub emotion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptDraft {
    pub title: String,
    pub topic: String,
    pub summary: String,
    pub guests: Vec<String>,
    pub dialogue: Vec<DialogueLine>,
}

impl ScriptDraft {
    /// Builds a draft from a completed preview result.
    ///
    /// The title falls back to the topic and every line without an emotion
    /// gets [`DEFAULT_EMOTION`].
    pub fn from_result(result: &TaskResult) -> Self {
        let title = result
            .title
            .clone()
            .filter(|title| !title.is_empty())
            .or_else(|| result.topic.clone())
            .unwrap_or_default();
        Self {
            title,
            topic: result.topic.clone().unwrap_or_default(),
            summary: result.summary.clone().unwrap_or_default(),
            guests: result.guests.clone(),
            dialogue: result
                .dialogue
                .iter()
                .map(|line| DialogueLine {
                    speaker: line.speaker.clone(),
                    text: line.text.clone(),
                    emotion: line
                        .emotion
                        .clone()
                        .filter(|emotion| !emotion.is_empty())
                        .unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
                })
                .collect(),
        }
    }

    pub fn has_dialogue(&self) -> bool {
        !self.dialogue.is_empty()
    }

    /// Copy of the draft ready for synthesis: text trimmed, empty lines dropped.
    pub fn trimmed_for_synthesis(&self) -> ScriptDraft {
        ScriptDraft {
            dialogue: self
                .dialogue
                .iter()
                .filter_map(|line| {
                    let text = line.text.trim();
                    (!text.is_empty()).then(|| DialogueLine {
                        speaker: line.speaker.clone(),
                        text: text.to_string(),
                        emotion: line.emotion.clone(),
                    })
                })
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Generate,
    Preview,
    Synthesize,
    Retime,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Generate => "generate",
            TaskKind::Preview => "preview",
            TaskKind::Synthesize => "synthesize",
            TaskKind::Retime => "retime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

/// Raw dialogue line as reported by the backend, before defaults apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultLine {
    pub speaker: String,
    pub text: String,
    pub emotion: Option<String>,
}

/// Payload attached to a terminal task event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskResult {
    pub episode_id: Option<EpisodeId>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub summary: Option<String>,
    pub guests: Vec<String>,
    pub dialogue: Vec<ResultLine>,
}

/// Request body for starting one of the backend tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskRequest {
    Generate {
        topic: String,
        selected_guests: Vec<String>,
    },
    Preview {
        topic: String,
        selected_guests: Vec<String>,
    },
    Synthesize {
        script: ScriptDraft,
    },
    Retime {
        episode_id: EpisodeId,
        line_speeds: Vec<f64>,
    },
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::Generate { .. } => TaskKind::Generate,
            TaskRequest::Preview { .. } => TaskKind::Preview,
            TaskRequest::Synthesize { .. } => TaskKind::Synthesize,
            TaskRequest::Retime { .. } => TaskKind::Retime,
        }
    }
}

/// One dialogue line of a produced episode, as needed for speed adjustment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpisodeLine {
    pub speaker: String,
    pub text: String,
    /// `None` when the backend did not report a usable numeric rate.
    pub speech_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpisodeDetail {
    pub id: EpisodeId,
    pub title: String,
    pub dialogue: Vec<EpisodeLine>,
}
