//! In-memory API key repository implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::api_key::{ApiKey, ApiKeyRepository};
use crate::domain::DomainError;

/// In-memory implementation of ApiKeyRepository, indexed by secret
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    keys: RwLock<HashMap<String, ApiKey>>,
}

impl InMemoryApiKeyRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial keys
    pub fn with_keys(keys: impl IntoIterator<Item = ApiKey>) -> Result<Self, DomainError> {
        let repo = Self::new();

        for key in keys {
            repo.insert(key)?;
        }

        Ok(repo)
    }

    /// Provision a key; ids and secrets must both be unique
    pub fn insert(&self, api_key: ApiKey) -> Result<(), DomainError> {
        let mut keys = self.keys.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        if keys.contains_key(api_key.key()) {
            return Err(DomainError::conflict(format!(
                "API key '{}' reuses an existing secret",
                api_key.id()
            )));
        }

        if keys.values().any(|k| k.id() == api_key.id()) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                api_key.id()
            )));
        }

        keys.insert(api_key.key().to_string(), api_key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn find_by_key(&self, secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(keys.get(secret).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::ApiKeyId;

    fn key(id: &str, secret: &str) -> ApiKey {
        ApiKey::new(ApiKeyId::new(id).unwrap(), secret).unwrap()
    }

    #[tokio::test]
    async fn test_find_by_exact_key() {
        let repo = InMemoryApiKeyRepository::with_keys([key("k1", "alpha-secret")]).unwrap();

        let found = repo.find_by_key("alpha-secret").await.unwrap();
        assert_eq!(found.unwrap().id().as_str(), "k1");
    }

    #[tokio::test]
    async fn test_no_partial_match() {
        let repo = InMemoryApiKeyRepository::with_keys([key("k1", "alpha-secret")]).unwrap();

        assert!(repo.find_by_key("alpha").await.unwrap().is_none());
        assert!(repo.find_by_key("alpha-secret-2").await.unwrap().is_none());
        assert!(repo.find_by_key("ALPHA-SECRET").await.unwrap().is_none());
    }

    #[test]
    fn test_rejects_duplicate_secret() {
        let result =
            InMemoryApiKeyRepository::with_keys([key("k1", "same"), key("k2", "same")]);
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let result =
            InMemoryApiKeyRepository::with_keys([key("k1", "one"), key("k1", "two")]);
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[test]
    fn test_len() {
        let repo = InMemoryApiKeyRepository::new();
        assert!(repo.is_empty());

        repo.insert(key("k1", "one")).unwrap();
        assert_eq!(repo.len(), 1);
    }
}
