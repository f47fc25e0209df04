//! Key store trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::ApiKey;
use crate::domain::DomainError;

/// Read-only lookup of key records by their secret
///
/// A missing key is `Ok(None)`; an unreachable or failing store is an `Err`.
/// Implementations must never fold the two together.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Find a key by exact match on its secret
    async fn find_by_key(&self, secret: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Cheap connectivity probe used by readiness checks
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
