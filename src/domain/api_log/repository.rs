//! Request ledger trait and count filter

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::entity::ApiLogEntry;
use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

/// Filter for counting ledger entries
///
/// Both bounds are inclusive. `api_key_id: None` counts entries from every
/// caller of the route and method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCountQuery {
    pub api_key_id: Option<ApiKeyId>,
    pub route: String,
    pub http_method: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl LogCountQuery {
    /// Count entries for a route and method across all keys
    pub fn for_method(
        route: impl Into<String>,
        http_method: impl Into<String>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Self {
        Self {
            api_key_id: None,
            route: route.into(),
            http_method: http_method.into(),
            from,
            to,
        }
    }

    /// Narrow the count to a single key
    pub fn with_api_key(mut self, api_key_id: ApiKeyId) -> Self {
        self.api_key_id = Some(api_key_id);
        self
    }

    /// Whether an entry falls inside this filter
    pub fn matches(&self, entry: &ApiLogEntry) -> bool {
        if let Some(ref key_id) = self.api_key_id {
            if entry.api_key_id.as_ref() != Some(key_id) {
                return false;
            }
        }

        entry.route == self.route
            && entry.http_method == self.http_method
            && entry.created_at >= self.from
            && entry.created_at <= self.to
    }
}

/// Append-only request ledger
///
/// `count` and `append` are each atomic against the store but are not
/// coordinated with one another.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiLogRepository: Send + Sync {
    /// Count entries matching the filter
    async fn count(&self, query: &LogCountQuery) -> Result<u64, DomainError>;

    /// Append an entry
    async fn append(&self, entry: ApiLogEntry) -> Result<(), DomainError>;

    /// Cheap connectivity probe used by readiness checks
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
