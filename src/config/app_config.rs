use serde::Deserialize;

use crate::domain::policy::PolicyDefinition;
use crate::infrastructure::storage::{PostgresConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub guard: GuardConfig,
    pub storage: StorageConfig,
    /// Per-method policies
    pub policies: Vec<PolicyDefinition>,
    /// Keys loaded into the in-memory key store at startup
    pub keys: Vec<SeedKeyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Guard behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Header carrying the key
    pub key_header_name: String,
    /// Parameter carrying the key; defaults to the header name
    pub key_parameter_name: Option<String>,
    /// Parameter listing requested relations
    pub include_parameter_name: String,
    /// Write admitted authenticated requests to the ledger
    pub logging_enabled: bool,
    /// Window used by limits that do not declare one
    pub default_limit_window: String,
    /// Refuse to start when a limit is misconfigured
    pub strict_limits: bool,
    /// Upper bound on each key store or ledger call
    pub store_timeout_ms: Option<u64>,
    /// Take the client address from the first `X-Forwarded-For` hop
    pub trust_forwarded_for: bool,
    /// Largest request body read when collecting parameters
    pub max_body_bytes: usize,
}

impl GuardConfig {
    pub fn key_parameter_name(&self) -> &str {
        self.key_parameter_name
            .as_deref()
            .unwrap_or(&self.key_header_name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageType,
    pub postgres: PostgresConfig,
    /// Oldest ledger entries are dropped past this size (memory backend)
    pub max_ledger_entries: Option<usize>,
}

/// A key provisioned from configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeedKeyConfig {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub ignore_limits: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            key_header_name: "key".to_string(),
            key_parameter_name: None,
            include_parameter_name: "include".to_string(),
            logging_enabled: true,
            default_limit_window: "1 minute".to_string(),
            strict_limits: false,
            store_timeout_ms: None,
            trust_forwarded_for: false,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a single file, skipping the layered lookup
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()
    }
}
