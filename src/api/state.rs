//! Application state shared by the guard middleware and handlers

use std::sync::Arc;

use crate::config::GuardConfig;
use crate::infrastructure::guard::GuardEngine;

/// How the middleware reads requests before handing them to the engine
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub include_parameter_name: String,
    pub trust_forwarded_for: bool,
    pub max_body_bytes: usize,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self::from(&GuardConfig::default())
    }
}

impl From<&GuardConfig> for RequestSettings {
    fn from(config: &GuardConfig) -> Self {
        Self {
            include_parameter_name: config.include_parameter_name.clone(),
            trust_forwarded_for: config.trust_forwarded_for,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<GuardEngine>,
    pub request: Arc<RequestSettings>,
}

impl AppState {
    pub fn new(guard: Arc<GuardEngine>, request: RequestSettings) -> Self {
        Self {
            guard,
            request: Arc::new(request),
        }
    }
}
