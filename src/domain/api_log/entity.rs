//! Request ledger entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;

/// Ledger entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiLogEntryId(Uuid);

impl ApiLogEntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ApiLogEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One admitted request, recorded once and never mutated
///
/// `created_at` is the timestamp window counting is based on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLogEntry {
    pub id: ApiLogEntryId,
    pub api_key_id: Option<ApiKeyId>,
    pub route: String,
    pub http_method: String,
    pub params: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ApiLogEntry {
    pub fn new(
        api_key_id: Option<ApiKeyId>,
        route: impl Into<String>,
        http_method: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApiLogEntryId::generate(),
            api_key_id,
            route: route.into(),
            http_method: http_method.into(),
            params: String::new(),
            ip_address: None,
            created_at,
        }
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    pub fn with_ip_address(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}
