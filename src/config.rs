//! Process Configuration
//!
//! Settings are layered: built-in defaults, then an optional YAML file,
//! then `WORKFLOW_*` environment variables.
//!
//! ```yaml
//! default_source_identifier: acct1
//! default_item_count: 3
//! default_step_timeout_seconds: 45
//! publish_step_timeout_seconds: 1200
//! auto_posting_enabled: false
//! demo_mode: true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::content::{
    ArchivePublisher, Collaborators, ContentType, DemoFetcher, DirectoryFetcher, Fetcher,
    KeywordClassifier, TidyTransformer,
};
use crate::error::{ConfigError, WorkflowError};
use crate::execution::ExecutorOptions;
use crate::workflow::{RunRequest, DEFAULT_MAX_ITEM_COUNT};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "contentflow.yaml";

/// Process-wide settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub default_source_identifier: Option<String>,
    pub default_item_count: u32,
    pub max_item_count: u32,
    pub default_step_timeout_seconds: f64,
    pub publish_step_timeout_seconds: Option<f64>,
    pub auto_posting_enabled: bool,
    pub demo_mode: bool,
    pub publish_token: Option<String>,
    pub data_dir: PathBuf,
    pub bind_address: String,
    pub cleanup_age_hours: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_source_identifier: None,
            default_item_count: 1,
            max_item_count: DEFAULT_MAX_ITEM_COUNT,
            default_step_timeout_seconds: 60.0,
            publish_step_timeout_seconds: None,
            auto_posting_enabled: true,
            demo_mode: false,
            publish_token: None,
            data_dir: PathBuf::from("./data"),
            bind_address: "127.0.0.1:8000".to_string(),
            cleanup_age_hours: 24,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or [`DEFAULT_CONFIG_FILE`] if present),
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        settings.apply_overrides(|key| env::var(key).ok())?;
        settings.check()?;
        Ok(settings)
    }

    /// Reads a YAML settings file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?;

        info!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Applies `WORKFLOW_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WORKFLOW_DEFAULT_SOURCE") {
            self.default_source_identifier = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("WORKFLOW_DEFAULT_COUNT") {
            self.default_item_count = parse_value("WORKFLOW_DEFAULT_COUNT", &v)?;
        }
        if let Some(v) = lookup("WORKFLOW_MAX_COUNT") {
            self.max_item_count = parse_value("WORKFLOW_MAX_COUNT", &v)?;
        }
        if let Some(v) = lookup("WORKFLOW_STEP_TIMEOUT") {
            self.default_step_timeout_seconds = parse_value("WORKFLOW_STEP_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("WORKFLOW_POSTING_TIMEOUT") {
            self.publish_step_timeout_seconds = Some(parse_value("WORKFLOW_POSTING_TIMEOUT", &v)?);
        }
        if let Some(v) = lookup("WORKFLOW_ENABLE_AUTO_POSTING") {
            self.auto_posting_enabled = parse_bool("WORKFLOW_ENABLE_AUTO_POSTING", &v)?;
        }
        if let Some(v) = lookup("WORKFLOW_DEMO_MODE") {
            self.demo_mode = parse_bool("WORKFLOW_DEMO_MODE", &v)?;
        }
        if let Some(v) = lookup("WORKFLOW_PUBLISH_TOKEN") {
            self.publish_token = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("WORKFLOW_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("WORKFLOW_BIND") {
            self.bind_address = v;
        }
        if let Some(v) = lookup("WORKFLOW_CLEANUP_AGE_HOURS") {
            self.cleanup_age_hours = parse_value("WORKFLOW_CLEANUP_AGE_HOURS", &v)?;
        }
        Ok(())
    }

    /// Rejects values the executor cannot work with.
    fn check(&self) -> Result<(), ConfigError> {
        if !valid_seconds(self.default_step_timeout_seconds) {
            return Err(ConfigError::InvalidValue {
                key: "default_step_timeout_seconds".to_string(),
                value: self.default_step_timeout_seconds.to_string(),
            });
        }
        if let Some(secs) = self.publish_step_timeout_seconds {
            if !valid_seconds(secs) {
                return Err(ConfigError::InvalidValue {
                    key: "publish_step_timeout_seconds".to_string(),
                    value: secs.to_string(),
                });
            }
        }
        if self.default_item_count == 0 || self.default_item_count > self.max_item_count {
            return Err(ConfigError::InvalidValue {
                key: "default_item_count".to_string(),
                value: self.default_item_count.to_string(),
            });
        }
        Ok(())
    }

    pub fn default_step_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.default_step_timeout_seconds)
    }

    pub fn cleanup_age(&self) -> Duration {
        Duration::from_secs(self.cleanup_age_hours.saturating_mul(3600))
    }

    pub fn raw_content_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn posted_dir(&self) -> PathBuf {
        self.data_dir.join("posted")
    }

    /// Fills in missing request fields from the configured defaults.
    pub fn resolve_request(
        &self,
        source_identifier: Option<String>,
        item_count: Option<u32>,
        type_filter: Option<ContentType>,
        per_step_timeout_seconds: Option<f64>,
    ) -> Result<RunRequest, WorkflowError> {
        let source = source_identifier
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.default_source_identifier.clone())
            .ok_or_else(|| {
                WorkflowError::InvalidRequest(
                    "sourceIdentifier is required (set WORKFLOW_DEFAULT_SOURCE or provide one)"
                        .to_string(),
                )
            })?;

        Ok(RunRequest {
            source_identifier: source,
            item_count: item_count.unwrap_or(self.default_item_count),
            type_filter,
            per_step_timeout_seconds,
        })
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            default_step_timeout: self.default_step_timeout(),
            publish_step_timeout: self.publish_step_timeout_seconds.map(Duration::from_secs_f64),
            auto_posting_enabled: self.auto_posting_enabled,
            max_item_count: self.max_item_count,
        }
    }

    /// Builds the in-process collaborators for these settings.
    pub fn collaborators(&self) -> Collaborators {
        let fetcher: Arc<dyn Fetcher> = if self.demo_mode {
            debug!("Using demo content source");
            Arc::new(DemoFetcher::new())
        } else {
            debug!("Reading content from {}", self.raw_content_dir().display());
            Arc::new(DirectoryFetcher::new(self.raw_content_dir()))
        };

        Collaborators::new(
            fetcher,
            Arc::new(KeywordClassifier::new()),
            Arc::new(TidyTransformer::new()),
            Arc::new(ArchivePublisher::new(self.posted_dir(), self.publish_token.clone())),
        )
    }
}

fn valid_seconds(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0 && secs <= u32::MAX as f64
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
