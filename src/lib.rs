//! API Guard
//!
//! Inbound request guard for HTTP APIs:
//! - Opaque key authentication (header or request parameter)
//! - Per-method minimum key levels
//! - Sliding-window rate limits per key and per method
//! - A request ledger recording admitted requests

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::{AppState, RequestSettings};
use config::SeedKeyConfig;
use domain::{
    api_key::{ApiKey, ApiKeyId, ApiKeyRepository},
    api_log::ApiLogRepository,
    policy::{LimitWindow, StaticPolicyRegistry},
};
use infrastructure::{
    api_key::{InMemoryApiKeyRepository, PostgresApiKeyRepository},
    api_log::{InMemoryApiLogRepository, PostgresApiLogRepository},
    guard::{GuardEngine, GuardSettings},
    storage::{connect_pool, run_guard_migrations, StorageType},
};
use tracing::{info, warn};

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let registry = build_policy_registry(config, config.guard.strict_limits)?;
    info!(policies = registry.len(), "Policy registry built");

    let (keys, ledger): (Arc<dyn ApiKeyRepository>, Arc<dyn ApiLogRepository>) =
        match config.storage.backend {
            StorageType::InMemory => {
                info!("Using in-memory key store and request ledger");
                let keys = InMemoryApiKeyRepository::with_keys(seed_keys(&config.keys)?)?;
                info!(keys = keys.len(), "Seeded API keys");

                let ledger = match config.storage.max_ledger_entries {
                    Some(max) => InMemoryApiLogRepository::with_retention(max),
                    None => InMemoryApiLogRepository::new(),
                };

                (Arc::new(keys), Arc::new(ledger))
            }
            StorageType::Postgres => {
                info!("Using PostgreSQL key store and request ledger");
                let pool = connect_pool(&config.storage.postgres).await?;
                run_guard_migrations(&pool).await?;

                if !config.keys.is_empty() {
                    warn!(
                        keys = config.keys.len(),
                        "Configured keys are only loaded by the in-memory backend; ignoring them"
                    );
                }

                (
                    Arc::new(PostgresApiKeyRepository::new(pool.clone())),
                    Arc::new(PostgresApiLogRepository::new(pool)),
                )
            }
        };

    let engine = GuardEngine::new(keys, ledger, Arc::new(registry), guard_settings(config));

    Ok(AppState::new(
        Arc::new(engine),
        RequestSettings::from(&config.guard),
    ))
}

/// Build the policy registry declared in configuration
pub fn build_policy_registry(
    config: &AppConfig,
    strict: bool,
) -> anyhow::Result<StaticPolicyRegistry> {
    let default_window = LimitWindow::parse(&config.guard.default_limit_window).map_err(|e| {
        anyhow::anyhow!(
            "Invalid default limit window '{}': {}",
            config.guard.default_limit_window,
            e
        )
    })?;

    Ok(StaticPolicyRegistry::from_definitions(
        &config.policies,
        default_window,
        strict,
    )?)
}

/// Validate the keys declared in configuration
pub fn seed_keys(seeds: &[SeedKeyConfig]) -> anyhow::Result<Vec<ApiKey>> {
    seeds
        .iter()
        .map(|seed| {
            let id = ApiKeyId::new(seed.id.clone())
                .map_err(|e| anyhow::anyhow!("Invalid key id '{}': {}", seed.id, e))?;
            let key = ApiKey::new(id, seed.key.clone())
                .map_err(|e| anyhow::anyhow!("Invalid secret for key '{}': {}", seed.id, e))?;

            Ok(key
                .with_level(seed.level)
                .with_ignore_limits(seed.ignore_limits))
        })
        .collect()
}

fn guard_settings(config: &AppConfig) -> GuardSettings {
    GuardSettings {
        key_header_name: config.guard.key_header_name.clone(),
        key_parameter_name: config.guard.key_parameter_name().to_string(),
        logging_enabled: config.guard.logging_enabled,
        store_timeout: config.guard.store_timeout_ms.map(Duration::from_millis),
    }
}
