use geoquiz_core::knowledge::{BaseSet, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, WikidataOptions};
use geoquiz_engine::BoundKind;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LOG_FILE: &str = "geoquiz.log";

/// Root game configuration loaded from YAML. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GameConfig {
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub game: PlayConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: GameConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.knowledge_base.validate()?;
        self.game.validate()?;
        self.outputs.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_set: BaseSet,
    /// Offline atlas; when set the remote endpoint is never contacted.
    #[serde(default)]
    pub atlas: Option<PathBuf>,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_set: BaseSet::default(),
            atlas: None,
        }
    }
}

impl KnowledgeBaseConfig {
    fn validate(&mut self) -> Result<(), ValidationError> {
        self.endpoint = self.endpoint.trim().to_string();
        if self.endpoint.is_empty() {
            return Err(invalid("knowledge_base.endpoint", "endpoint must not be empty"));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(invalid(
                "knowledge_base.endpoint",
                format!("'{}' is not an http(s) URL", self.endpoint),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(invalid(
                "knowledge_base.user_agent",
                "user agent must not be empty",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(invalid(
                "knowledge_base.timeout_secs",
                "timeout must be greater than zero",
            ));
        }

        if let Some(atlas) = &self.atlas {
            validate_path("knowledge_base.atlas", atlas)?;
        }
        Ok(())
    }

    pub fn wikidata_options(&self) -> WikidataOptions {
        WikidataOptions {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            base_set: self.base_set,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayConfig {
    /// Fixed seed for reproducible games; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_bounds")]
    pub bounds: Vec<BoundKind>,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            seed: None,
            bounds: default_bounds(),
        }
    }
}

impl PlayConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.bounds.is_empty() {
            return Err(invalid("game.bounds", "at least one bound must be enabled"));
        }

        let mut seen = HashSet::new();
        for kind in &self.bounds {
            if !seen.insert(*kind) {
                return Err(invalid(
                    "game.bounds",
                    format!("bound '{kind}' listed more than once"),
                ));
            }
        }
        Ok(())
    }
}

fn default_bounds() -> Vec<BoundKind> {
    BoundKind::ALL.to_vec()
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OutputsConfig {
    /// JSONL file receiving one row per answered question.
    #[serde(default)]
    pub transcript: Option<PathBuf>,
}

impl OutputsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(transcript) = &self.transcript {
            validate_path("outputs.transcript", transcript)?;
        }
        Ok(())
    }
}

/// Logging configuration. Structured logs are off by default; plain logs go
/// to stderr so they never mix with the questions on stdout.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            file: default_log_file(),
        }
    }
}

impl LoggingConfig {
    fn validate(&mut self) -> Result<(), ValidationError> {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
        if self.level().is_none() {
            return Err(invalid(
                "logging.tracing_level",
                format!("unknown level '{}'", self.tracing_level),
            ));
        }
        if self.enable_structured {
            validate_path("logging.file", &self.file)?;
        }
        Ok(())
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "warn".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn validate_path(field: &str, path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() || path.components().count() == 0 {
        return Err(invalid(field, "path must not be empty"));
    }
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
