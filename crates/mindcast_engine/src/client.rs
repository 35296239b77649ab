use std::time::Duration;

use async_trait::async_trait;
use mindcast_logging::{mc_debug, mc_info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::stream::SseProgressSource;
use crate::types::{
    EpisodeDetail, EpisodeSummary, ErrorBody, Guest, NewsResponse, RetimeRequest, TaskCreated,
    TaskId, TaskSpec, TopicRequest,
};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to REST calls only; progress streams are bounded by the idle timeout.
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Starting and cancelling backend tasks.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn start_task(&self, spec: &TaskSpec) -> Result<TaskId, ApiError>;
    async fn cancel_task(&self, task_id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(network_error)?;
        Ok(Self {
            client,
            base,
            request_timeout: settings.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Progress source sharing this client's connection pool.
    pub fn progress_source(&self) -> SseProgressSource {
        SseProgressSource::new(self.client.clone(), self.base.clone())
    }

    pub async fn fetch_news(
        &self,
        topic: Option<&str>,
        max_results: u32,
    ) -> Result<NewsResponse, ApiError> {
        let mut url = self.endpoint(&["api", "debug", "news"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("max_results", &max_results.to_string());
            if let Some(topic) = topic.map(str::trim).filter(|topic| !topic.is_empty()) {
                query.append_pair("topic", topic);
            }
        }
        mc_debug!("Fetching news from {url}");
        self.send_json(self.client.get(url)).await
    }

    pub async fn list_guests(&self) -> Result<Vec<Guest>, ApiError> {
        let url = self.endpoint(&["api", "guests"])?;
        self.send_json(self.client.get(url)).await
    }

    /// Creates or updates a guest; returns the full catalog.
    pub async fn save_guest(&self, guest: &Guest, is_edit: bool) -> Result<Vec<Guest>, ApiError> {
        let request = if is_edit {
            self.client
                .put(self.endpoint(&["api", "guests", guest.name.as_str()])?)
        } else {
            self.client.post(self.endpoint(&["api", "guests"])?)
        };
        self.send_json(with_json(request, guest)?).await
    }

    /// Deletes a guest; returns the remaining catalog.
    pub async fn delete_guest(&self, name: &str) -> Result<Vec<Guest>, ApiError> {
        let url = self.endpoint(&["api", "guests", name])?;
        self.send_json(self.client.delete(url)).await
    }

    pub async fn list_episodes(&self) -> Result<Vec<EpisodeSummary>, ApiError> {
        let url = self.endpoint(&["api", "episodes"])?;
        self.send_json(self.client.get(url)).await
    }

    pub async fn fetch_episode(&self, episode_id: &str) -> Result<EpisodeDetail, ApiError> {
        let url = self.endpoint(&["api", "episodes", episode_id])?;
        self.send_json(self.client.get(url)).await
    }

    pub async fn cleanup_segments(&self, episode_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "episodes", episode_id, "segments", "cleanup"])?;
        self.dispatch(self.client.post(url)).await.map(|_| ())
    }

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint(&self.base, segments)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.dispatch(request).await?;
        let body = response.bytes().await.map_err(network_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::Network(format!("unexpected response body: {err}")))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Validation {
            status: status.as_u16(),
            detail: error_detail(status, &body),
        })
    }
}

#[async_trait]
impl TaskBackend for ApiClient {
    async fn start_task(&self, spec: &TaskSpec) -> Result<TaskId, ApiError> {
        let request = match spec {
            TaskSpec::Generate {
                topic,
                selected_guests,
            } => with_json(
                self.client.post(self.endpoint(&["api", "generate"])?),
                &TopicRequest {
                    topic,
                    selected_guests,
                },
            )?,
            TaskSpec::Preview {
                topic,
                selected_guests,
            } => with_json(
                self.client.post(self.endpoint(&["api", "script", "preview"])?),
                &TopicRequest {
                    topic,
                    selected_guests,
                },
            )?,
            TaskSpec::Synthesize(script) => with_json(
                self.client
                    .post(self.endpoint(&["api", "script", "synthesize"])?),
                script,
            )?,
            TaskSpec::Retime {
                episode_id,
                line_speeds,
            } => with_json(
                self.client
                    .post(self.endpoint(&["api", "episodes", episode_id.as_str(), "retime"])?),
                &RetimeRequest { line_speeds },
            )?,
        };
        let created: TaskCreated = self.send_json(request).await?;
        mc_info!("Backend started {:?} task {}", spec.kind(), created.task_id);
        Ok(created.task_id)
    }

    async fn cancel_task(&self, task_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "tasks", task_id, "cancel"])?;
        self.dispatch(self.client.post(url)).await.map(|_| ())
    }
}

/// Appends percent-encoded path segments to `base`.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn with_json<B: Serialize + ?Sized>(
    request: RequestBuilder,
    body: &B,
) -> Result<RequestBuilder, ApiError> {
    let payload = serde_json::to_vec(body).map_err(|err| ApiError::Network(err.to_string()))?;
    Ok(request
        .header(CONTENT_TYPE, "application/json")
        .body(payload))
}

fn network_error(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

fn error_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail);
    match detail {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::Null) | None => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        Some(other) => other.to_string(),
    }
}
