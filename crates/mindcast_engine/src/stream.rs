use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use url::Url;

use crate::client::endpoint;
use crate::error::StreamError;
use crate::types::TaskEvent;

pub type EventStream = BoxStream<'static, Result<TaskEvent, StreamError>>;

/// Opens the progress stream of one task.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn open(&self, task_id: &str) -> Result<EventStream, StreamError>;
}

/// Server-sent events from `GET /api/status/{task_id}`, one JSON object per `data:` field.
#[derive(Debug, Clone)]
pub struct SseProgressSource {
    client: reqwest::Client,
    base: Url,
}

impl SseProgressSource {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }
}

#[async_trait]
impl ProgressSource for SseProgressSource {
    async fn open(&self, task_id: &str) -> Result<EventStream, StreamError> {
        let url = endpoint(&self.base, &["api", "status", task_id])
            .map_err(|err| StreamError::Transport(err.to_string()))?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|err| StreamError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Transport(format!("HTTP {}", status.as_u16())));
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(decode_event(&event.data)),
                    Err(err) => Some(Err(StreamError::Transport(err.to_string()))),
                }
            });
        Ok(Box::pin(stream))
    }
}

pub fn decode_event(data: &str) -> Result<TaskEvent, StreamError> {
    serde_json::from_str::<TaskEvent>(data)
        .map(TaskEvent::normalized)
        .map_err(|err| StreamError::Decode(err.to_string()))
}
