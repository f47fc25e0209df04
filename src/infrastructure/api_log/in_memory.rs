//! In-memory request ledger

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::api_log::{ApiLogEntry, ApiLogRepository, LogCountQuery};
use crate::domain::DomainError;

/// In-memory ledger
///
/// Unbounded by default. With a retention cap the oldest entries are dropped
/// once the cap is exceeded, which can under-count long windows.
#[derive(Debug, Default)]
pub struct InMemoryApiLogRepository {
    entries: RwLock<VecDeque<ApiLogEntry>>,
    max_entries: Option<usize>,
}

impl InMemoryApiLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that keeps at most `max_entries` entries
    pub fn with_retention(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: Some(max_entries),
        }
    }

    /// Snapshot of every entry, oldest first
    pub fn entries(&self) -> Vec<ApiLogEntry> {
        self.entries
            .read()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ApiLogRepository for InMemoryApiLogRepository {
    async fn count(&self, query: &LogCountQuery) -> Result<u64, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(entries.iter().filter(|entry| query.matches(entry)).count() as u64)
    }

    async fn append(&self, entry: ApiLogEntry) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        entries.push_back(entry);

        if let Some(max) = self.max_entries {
            while entries.len() > max {
                entries.pop_front();
            }
        }

        Ok(())
    }
}
