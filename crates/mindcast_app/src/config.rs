//! RON configuration for the `mindcast` binary.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mindcast_core::{WorkflowMode, DEFAULT_NEWS_RESULTS};
use mindcast_engine::{ApiSettings, EngineSettings, DEFAULT_IDLE_TIMEOUT};
use mindcast_logging::{parse_level, LogDestination, LogSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "mindcast.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub workflow_mode: String,
    pub max_news_results: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub stream_idle_timeout_secs: u64,
    pub log_level: String,
    pub log_destination: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            base_url: api.base_url,
            workflow_mode: WorkflowMode::default().as_str().to_string(),
            max_news_results: DEFAULT_NEWS_RESULTS,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            stream_idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
            log_level: "info".to_string(),
            log_destination: "terminal".to_string(),
            log_file: PathBuf::from("./mindcast.log"),
        }
    }
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub workflow_mode: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content)
            .map(Some)
            .map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(base_url) = &overrides.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(mode) = &overrides.workflow_mode {
            self.workflow_mode = mode.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
    }

    /// Unknown names fall back to one-click.
    pub fn workflow_mode(&self) -> WorkflowMode {
        WorkflowMode::parse(&self.workflow_mode).unwrap_or_default()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            api: ApiSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
                request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            },
            stream_idle_timeout: Duration::from_secs(self.stream_idle_timeout_secs.max(1)),
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        let defaults = LogSettings::default();
        LogSettings {
            level: parse_level(&self.log_level).unwrap_or(defaults.level),
            destination: LogDestination::parse(&self.log_destination)
                .unwrap_or(defaults.destination),
            file: self.log_file.clone(),
        }
    }
}
