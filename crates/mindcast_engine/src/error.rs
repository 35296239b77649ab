use std::time::Duration;

use thiserror::Error;

/// Failure of a REST call to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Transport failure or a body that could not be decoded.
    #[error("network error: {0}")]
    Network(String),
    /// Non-success status; `detail` comes from the backend when it sent one.
    #[error("{detail}")]
    Validation { status: u16, detail: String },
}

/// Failure of a task progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("progress stream unavailable: {0}")]
    Transport(String),
    #[error("malformed progress event: {0}")]
    Decode(String),
    #[error("no progress event for {}s", .0.as_secs())]
    IdleTimeout(Duration),
    #[error("progress stream ended before the task finished")]
    EndedWithoutTerminal,
}
