//! Client configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid.
//! Command line flags are applied on top by the binary.
//!
//! ```toml
//! [api]
//! base_url = "https://tasks.example.org/api"
//! timeout_secs = 10
//!
//! [feedback]
//! countdown_secs = 3
//! result_linger_secs = 3
//! audio = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! file = "attraction-quiz.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::session::{ControllerSettings, DEFAULT_COUNTDOWN_SECS};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub feedback: FeedbackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL of the Task API.
    pub base_url: Option<String>,
    /// Local question bank used instead of the remote API.
    pub bank: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            bank: None,
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub countdown_secs: u32,
    pub result_linger_secs: u64,
    pub audio: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            result_linger_secs: 3,
            audio: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives; `LOG_LEVEL` overrides this.
    pub level: String,
    /// `LOG_FORMAT` overrides this.
    pub format: LogFormat,
    /// Log file. The terminal belongs to the UI, so no file means no logs.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: Some(PathBuf::from("attraction-quiz.log")),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(target: "attraction_quiz", path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            countdown_secs: self.feedback.countdown_secs,
            result_linger: Duration::from_secs(self.feedback.result_linger_secs),
        }
    }
}
