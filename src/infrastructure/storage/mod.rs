//! Storage infrastructure - backend selection, pooling and migrations

pub mod migrations;
mod postgres;

use serde::Deserialize;

pub use migrations::{guard_migrations, run_guard_migrations, Migration, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig};

/// Backend holding keys and the request ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    #[default]
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

impl TryFrom<String> for StorageType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown storage backend '{}'", value))
    }
}
