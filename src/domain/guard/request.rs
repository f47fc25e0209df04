//! Transport-neutral view of an inbound request

use std::collections::{BTreeMap, HashMap};

/// Replacement for secrets in audit output
pub const REDACTED: &str = "[REDACTED]";

/// What the guard needs to know about a request
#[derive(Debug, Clone, Default)]
pub struct GuardRequest {
    /// Route identifier; `None` when routing did not resolve to a method
    pub route: Option<String>,
    pub http_method: String,
    headers: HashMap<String, String>,
    params: BTreeMap<String, String>,
    pub ip_address: Option<String>,
}

impl GuardRequest {
    pub fn new(route: Option<String>, http_method: impl Into<String>) -> Self {
        Self {
            route,
            http_method: http_method.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    /// Request that resolved to a route
    pub fn for_route(route: impl Into<String>, http_method: impl Into<String>) -> Self {
        Self::new(Some(route.into()), http_method)
    }

    /// Add a header; names are case-insensitive
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add a query or body parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Parameters serialized for the audit trail, with `secret_param` redacted
    pub fn audit_params(&self, secret_param: &str) -> String {
        let redacted: BTreeMap<&str, &str> = self
            .params
            .iter()
            .map(|(name, value)| {
                if name == secret_param {
                    (name.as_str(), REDACTED)
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        serde_json::to_string(&redacted).unwrap_or_default()
    }
}
