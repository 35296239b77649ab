//! Wire schema of the MindCast backend.
//!
//! Every optional field has a named default here so the rest of the crate
//! never deals with missing keys.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type TaskId = String;

/// Reads an explicit JSON `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Generate,
    Preview,
    Synthesize,
    Retime,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NewsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<NewsItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub age: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mbti: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personality: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub occupation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaking_style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub voice_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub background: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptLine {
    pub speaker: String,
    pub text: String,
    pub emotion: String,
}

/// Body of the synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptPayload {
    pub title: String,
    pub topic: String,
    pub summary: String,
    pub guests: Vec<String>,
    pub dialogue: Vec<ScriptLine>,
}

/// A backend task to start.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSpec {
    Generate {
        topic: String,
        selected_guests: Vec<String>,
    },
    Preview {
        topic: String,
        selected_guests: Vec<String>,
    },
    Synthesize(ScriptPayload),
    Retime {
        episode_id: String,
        line_speeds: Vec<f64>,
    },
}

impl TaskSpec {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskSpec::Generate { .. } => TaskKind::Generate,
            TaskSpec::Preview { .. } => TaskKind::Preview,
            TaskSpec::Synthesize(_) => TaskKind::Synthesize,
            TaskSpec::Retime { .. } => TaskKind::Retime,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicRequest<'a> {
    pub topic: &'a str,
    pub selected_guests: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct RetimeRequest<'a> {
    pub line_speeds: &'a [f64],
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskCreated {
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Started,
    #[default]
    Running,
    Completed,
    Failed,
    Cancelled,
    /// Any status string this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ResultLine {
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub episode_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guests: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dialogue: Vec<ResultLine>,
}

/// One message of a task's progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TaskEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub episode_id: Option<String>,
}

impl TaskEvent {
    /// Folds a top-level `episode_id` into the result.
    pub fn normalized(mut self) -> Self {
        if let Some(episode_id) = self.episode_id.take() {
            let result = self.result.get_or_insert_with(TaskResult::default);
            if result.episode_id.is_none() {
                result.episode_id = Some(episode_id);
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EpisodeLine {
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    speech_rate: Option<Value>,
}

impl EpisodeLine {
    /// Rate as a finite number; strings holding a number are accepted.
    pub fn speech_rate(&self) -> Option<f64> {
        let rate = match self.speech_rate.as_ref()? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        rate.is_finite().then_some(rate)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EpisodeDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guests: Vec<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_audio: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dialogue: Vec<EpisodeLine>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EpisodeSummary {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guests: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub word_count: u64,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_audio: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(json: &str) -> EpisodeLine {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn speech_rate_accepts_numbers_and_numeric_strings() {
        assert_eq!(line(r#"{"speech_rate": 1.5}"#).speech_rate(), Some(1.5));
        assert_eq!(line(r#"{"speech_rate": "0.8"}"#).speech_rate(), Some(0.8));
        assert_eq!(line(r#"{"speech_rate": "fast"}"#).speech_rate(), None);
        assert_eq!(line(r#"{"speech_rate": null}"#).speech_rate(), None);
        assert_eq!(line(r#"{"speech_rate": [1]}"#).speech_rate(), None);
        assert_eq!(line(r#"{}"#).speech_rate(), None);
    }

    #[test]
    fn status_values_decode() {
        let event: TaskEvent =
            serde_json::from_str(r#"{"status": "started", "stage": "initializing"}"#).unwrap();
        assert_eq!(event.status, TaskStatus::Started);
        assert!(!event.status.is_terminal());

        let event: TaskEvent = serde_json::from_str(r#"{"status": "paused"}"#).unwrap();
        assert_eq!(event.status, TaskStatus::Unknown);

        let event: TaskEvent = serde_json::from_str(r#"{"status": "cancelled"}"#).unwrap();
        assert!(event.status.is_terminal());
    }

    #[test]
    fn top_level_episode_id_moves_into_result() {
        let event: TaskEvent = serde_json::from_str(
            r#"{"status": "completed", "stage": "done", "detail": "ok", "episode_id": "ep1"}"#,
        )
        .unwrap();
        let event = event.normalized();
        assert_eq!(event.result.unwrap().episode_id.as_deref(), Some("ep1"));
    }

    #[test]
    fn null_fields_read_as_defaults() {
        let event: TaskEvent = serde_json::from_str(
            r#"{"status": "completed", "stage": null, "detail": null, "episode_id": "ep1",
                "result": {"guests": null, "dialogue": [{"speaker": null, "text": "Hi"}]}}"#,
        )
        .unwrap();
        assert_eq!(event.status, TaskStatus::Completed);
        assert_eq!(event.stage, "");
        assert_eq!(event.detail, "");
        let result = event.normalized().result.unwrap();
        assert_eq!(result.episode_id.as_deref(), Some("ep1"));
        assert!(result.guests.is_empty());
        assert_eq!(result.dialogue[0].speaker, "");
        assert_eq!(result.dialogue[0].text, "Hi");

        let event: TaskEvent = serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(event.status, TaskStatus::Running);

        let episode: EpisodeDetail = serde_json::from_str(
            r#"{"id": "ep1", "title": null, "dialogue": [{"speaker": "Ada", "text": null, "speech_rate": 1.2}]}"#,
        )
        .unwrap();
        assert_eq!(episode.title, "");
        assert_eq!(episode.dialogue[0].text, "");
        assert_eq!(episode.dialogue[0].speech_rate(), Some(1.2));
    }

    #[test]
    fn news_defaults_when_fields_missing() {
        let news: NewsResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(news, NewsResponse::default());
    }
}
