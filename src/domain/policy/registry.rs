//! Policy registry
//!
//! The host supplies every policy up front; lookups are plain reads.

use std::collections::HashMap;

use super::definition::{PolicyDefinition, ANY_METHOD};
use super::entity::{LimitScope, LimitSetting, MethodPolicy};
use super::window::LimitWindow;
use crate::domain::DomainError;

/// Registry key: route identifier plus upper-cased HTTP method (or `*`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    route: String,
    method: String,
}

impl RouteKey {
    pub fn new(route: impl Into<String>, method: impl AsRef<str>) -> Self {
        Self {
            route: route.into(),
            method: method.as_ref().to_ascii_uppercase(),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}

/// A problem in a policy that does not stop the guard from running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationWarning {
    pub route: RouteKey,
    pub scope: Option<LimitScope>,
    pub message: String,
}

impl std::fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scope {
            Some(scope) => write!(f, "{} ({} limit): {}", self.route, scope, self.message),
            None => write!(f, "{}: {}", self.route, self.message),
        }
    }
}

/// Read-only lookup of `(route, method) -> MethodPolicy`
pub trait PolicyRegistry: Send + Sync {
    /// Find the policy for a route and method
    ///
    /// `None` means the route has no declared policy; callers apply
    /// `MethodPolicy::default()`.
    fn lookup(&self, route: &str, method: &str) -> Option<&MethodPolicy>;

    /// Every declared policy, in a stable order
    fn policies(&self) -> Vec<(&RouteKey, &MethodPolicy)>;

    /// Problems worth reporting once, at startup
    fn diagnostics(&self) -> Vec<ConfigurationWarning> {
        let mut warnings = Vec::new();

        for (route, policy) in self.policies() {
            for scope in [LimitScope::Key, LimitScope::Method] {
                if let Some(LimitSetting::Misconfigured { reason }) = policy.limits.get(scope) {
                    warnings.push(ConfigurationWarning {
                        route: route.clone(),
                        scope: Some(scope),
                        message: format!("{}; the limit is ignored", reason),
                    });
                }
            }

            if !policy.key_authentication {
                if policy.limits.key.is_some() {
                    warnings.push(ConfigurationWarning {
                        route: route.clone(),
                        scope: Some(LimitScope::Key),
                        message: "key limit on a route without key authentication is never evaluated"
                            .to_string(),
                    });
                }
                if policy.limits.method.is_some() {
                    warnings.push(ConfigurationWarning {
                        route: route.clone(),
                        scope: Some(LimitScope::Method),
                        message: "requests without key authentication are not logged, so this limit never triggers"
                            .to_string(),
                    });
                }
                if policy.minimum_level.is_some() {
                    warnings.push(ConfigurationWarning {
                        route: route.clone(),
                        scope: None,
                        message: "level on a route without key authentication is never evaluated"
                            .to_string(),
                    });
                }
            }
        }

        warnings
    }
}

/// Registry backed by a map built at startup
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyRegistry {
    policies: HashMap<RouteKey, MethodPolicy>,
}

impl StaticPolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy, builder style
    pub fn with_policy(
        mut self,
        route: impl Into<String>,
        method: impl AsRef<str>,
        policy: MethodPolicy,
    ) -> Self {
        self.insert(route, method, policy);
        self
    }

    /// Add a policy, returning the one it replaced
    pub fn insert(
        &mut self,
        route: impl Into<String>,
        method: impl AsRef<str>,
        policy: MethodPolicy,
    ) -> Option<MethodPolicy> {
        self.policies.insert(RouteKey::new(route, method), policy)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Build a registry from declared policies
    ///
    /// Duplicate declarations are rejected. With `strict` set, any
    /// misconfigured limit is rejected too; otherwise it is kept and reported
    /// through `diagnostics`.
    pub fn from_definitions(
        definitions: &[PolicyDefinition],
        default_window: LimitWindow,
        strict: bool,
    ) -> Result<Self, DomainError> {
        let mut registry = Self::new();

        for definition in definitions {
            if definition.route.trim().is_empty() {
                return Err(DomainError::configuration("policy route cannot be empty"));
            }

            let key = RouteKey::new(definition.route.clone(), &definition.method);
            let policy = definition.to_policy(default_window);

            if registry.policies.contains_key(&key) {
                return Err(DomainError::configuration(format!(
                    "duplicate policy for {}",
                    key
                )));
            }

            registry.policies.insert(key, policy);
        }

        if strict {
            let misconfigured: Vec<String> = registry
                .policies()
                .into_iter()
                .flat_map(|(key, policy)| {
                    [LimitScope::Key, LimitScope::Method]
                        .into_iter()
                        .filter_map(move |scope| match policy.limits.get(scope) {
                            Some(LimitSetting::Misconfigured { reason }) => {
                                Some(format!("{} ({} limit): {}", key, scope, reason))
                            }
                            _ => None,
                        })
                })
                .collect();

            if !misconfigured.is_empty() {
                return Err(DomainError::configuration(format!(
                    "misconfigured limits: {}",
                    misconfigured.join("; ")
                )));
            }
        }

        Ok(registry)
    }
}

impl PolicyRegistry for StaticPolicyRegistry {
    fn lookup(&self, route: &str, method: &str) -> Option<&MethodPolicy> {
        self.policies
            .get(&RouteKey::new(route, method))
            .or_else(|| self.policies.get(&RouteKey::new(route, ANY_METHOD)))
    }

    fn policies(&self) -> Vec<(&RouteKey, &MethodPolicy)> {
        let mut entries: Vec<_> = self.policies.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
