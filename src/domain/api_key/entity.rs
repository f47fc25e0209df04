//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_api_key_id, validate_api_key_secret, ApiKeyValidationError};

/// API Key identifier - alphanumeric, hyphens and underscores, max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKeyId(String);

impl ApiKeyId {
    /// Create a new ApiKeyId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, ApiKeyValidationError> {
        let id = id.into();
        validate_api_key_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKeyId {
    type Error = ApiKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKeyId> for String {
    fn from(id: ApiKeyId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A caller credential
///
/// Keys are issued out-of-band and are read-only to the guard. The secret is
/// compared by exact match only.
#[derive(Clone)]
pub struct ApiKey {
    id: ApiKeyId,
    key: String,
    level: i32,
    ignore_limits: bool,
    created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Create a key record with level 0 that is subject to limits
    pub fn new(id: ApiKeyId, key: impl Into<String>) -> Result<Self, ApiKeyValidationError> {
        let key = key.into();
        validate_api_key_secret(&key)?;

        Ok(Self {
            id,
            key,
            level: 0,
            ignore_limits: false,
            created_at: Utc::now(),
        })
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_ignore_limits(mut self, ignore_limits: bool) -> Self {
        self.ignore_limits = ignore_limits;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    /// The opaque secret presented by callers
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Authorization tier; higher values unlock higher-tier methods
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Whether every rate-limit scope is bypassed for this key
    pub fn ignores_limits(&self) -> bool {
        self.ignore_limits
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check whether this key meets a required level
    pub fn meets_level(&self, minimum_level: i32) -> bool {
        self.level >= minimum_level
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("key", &"[REDACTED]")
            .field("level", &self.level)
            .field("ignore_limits", &self.ignore_limits)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(level: i32) -> ApiKey {
        ApiKey::new(ApiKeyId::new("k1").unwrap(), "secret-1")
            .unwrap()
            .with_level(level)
    }

    #[test]
    fn test_new_key_defaults() {
        let api_key = ApiKey::new(ApiKeyId::new("k1").unwrap(), "secret-1").unwrap();

        assert_eq!(api_key.id().as_str(), "k1");
        assert_eq!(api_key.key(), "secret-1");
        assert_eq!(api_key.level(), 0);
        assert!(!api_key.ignores_limits());
    }

    #[test]
    fn test_rejects_invalid_secret() {
        let result = ApiKey::new(ApiKeyId::new("k1").unwrap(), "");
        assert_eq!(result.err(), Some(ApiKeyValidationError::EmptySecret));
    }

    #[test]
    fn test_meets_level() {
        assert!(key(5).meets_level(5));
        assert!(key(6).meets_level(5));
        assert!(!key(4).meets_level(5));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let output = format!("{:?}", key(1));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("secret-1"));
    }

    #[test]
    fn test_id_deserialization_is_validated() {
        let parsed: Result<ApiKeyId, _> = serde_json::from_str("\"bad id\"");
        assert!(parsed.is_err());

        let parsed: ApiKeyId = serde_json::from_str("\"good-id\"").unwrap();
        assert_eq!(parsed.as_str(), "good-id");
    }
}
