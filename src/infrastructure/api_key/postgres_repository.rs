//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of ApiKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn find_by_key(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, key, level, ignore_limits, created_at
            FROM api_keys
            WHERE key = $1
            "#,
        )
        .bind(secret)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.map(|row| row_to_api_key(&row)).transpose()
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Key store ping failed: {}", e)))?;

        Ok(())
    }
}

fn row_to_api_key(row: &PgRow) -> Result<ApiKey, DomainError> {
    let id: String = row.get("id");
    let key: String = row.get("key");
    let level: i32 = row.get("level");
    let ignore_limits: bool = row.get("ignore_limits");
    let created_at: DateTime<Utc> = row.get("created_at");

    let id = ApiKeyId::new(id.clone())
        .map_err(|e| DomainError::storage(format!("Stored API key ID '{}' is invalid: {}", id, e)))?;

    let api_key = ApiKey::new(id, key)
        .map_err(|e| DomainError::storage(format!("Stored API key is invalid: {}", e)))?;

    Ok(api_key
        .with_level(level)
        .with_ignore_limits(ignore_limits)
        .with_created_at(created_at))
}
