//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, GuardConfig, LogFormat, LoggingConfig, SeedKeyConfig, ServerConfig, StorageConfig,
};
