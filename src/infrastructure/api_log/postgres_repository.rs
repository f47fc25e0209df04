//! PostgreSQL request ledger

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::api_log::{ApiLogEntry, ApiLogRepository, LogCountQuery};
use crate::domain::DomainError;

/// PostgreSQL implementation of ApiLogRepository
///
/// Each count is a single `SELECT COUNT(*)` and each append a single
/// `INSERT`; the two are not wrapped in a transaction.
#[derive(Debug, Clone)]
pub struct PostgresApiLogRepository {
    pool: PgPool,
}

impl PostgresApiLogRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiLogRepository for PostgresApiLogRepository {
    async fn count(&self, query: &LogCountQuery) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM api_logs
            WHERE route = $1
              AND method = $2
              AND created_at >= $3
              AND created_at <= $4
              AND ($5::VARCHAR IS NULL OR api_key_id = $5)
            "#,
        )
        .bind(&query.route)
        .bind(&query.http_method)
        .bind(query.from)
        .bind(query.to)
        .bind(query.api_key_id.as_ref().map(|id| id.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count API log entries: {}", e)))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn append(&self, entry: ApiLogEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO api_logs (id, api_key_id, route, method, params, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.api_key_id.as_ref().map(|id| id.as_str()))
        .bind(&entry.route)
        .bind(&entry.http_method)
        .bind(&entry.params)
        .bind(&entry.ip_address)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to append API log entry: {}", e)))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Request ledger ping failed: {}", e)))?;

        Ok(())
    }
}
