//! Per-method guard policy

use serde::{Deserialize, Serialize};

use super::window::LimitWindow;

/// Dimension a limit is aggregated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitScope {
    /// Requests made with one key
    Key,
    /// Requests from every caller of a method
    Method,
}

impl std::fmt::Display for LimitScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key => write!(f, "key"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// A valid limit: at most `limit` requests per sliding `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRule {
    limit: u32,
    window: LimitWindow,
}

impl LimitRule {
    /// `None` when `limit` is zero
    pub fn new(limit: u32, window: LimitWindow) -> Option<Self> {
        (limit > 0).then_some(Self { limit, window })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> LimitWindow {
        self.window
    }
}

/// A configured limit, which may have failed validation
///
/// Misconfigured limits are kept rather than dropped so the guard can report
/// them while letting traffic through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitSetting {
    Rule(LimitRule),
    Misconfigured { reason: String },
}

impl LimitSetting {
    pub fn rule(&self) -> Option<&LimitRule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Misconfigured { .. } => None,
        }
    }

    pub fn misconfigured(reason: impl Into<String>) -> Self {
        Self::Misconfigured {
            reason: reason.into(),
        }
    }

    /// Validate a raw limit as it appears in configuration
    ///
    /// A missing window falls back to `default_window`.
    pub fn from_raw(
        limit: Option<i64>,
        window: Option<&str>,
        default_window: LimitWindow,
    ) -> Self {
        let limit = match limit {
            Some(value) if value > 0 => match u32::try_from(value) {
                Ok(limit) => limit,
                Err(_) => {
                    return Self::misconfigured(format!("limit {} is out of range", value));
                }
            },
            Some(value) => {
                return Self::misconfigured(format!(
                    "limit must be a positive integer, got {}",
                    value
                ));
            }
            None => return Self::misconfigured("limit is not set"),
        };

        let window = match window {
            Some(raw) => match LimitWindow::parse(raw) {
                Ok(window) => window,
                Err(e) => {
                    return Self::misconfigured(format!("invalid window '{}': {}", raw, e));
                }
            },
            None => default_window,
        };

        match LimitRule::new(limit, window) {
            Some(rule) => Self::Rule(rule),
            None => Self::misconfigured("limit must be a positive integer, got 0"),
        }
    }
}

impl From<LimitRule> for LimitSetting {
    fn from(rule: LimitRule) -> Self {
        Self::Rule(rule)
    }
}

/// Key-scoped and method-scoped limits of a method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodLimits {
    pub key: Option<LimitSetting>,
    pub method: Option<LimitSetting>,
}

impl MethodLimits {
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.method.is_none()
    }

    pub fn get(&self, scope: LimitScope) -> Option<&LimitSetting> {
        match scope {
            LimitScope::Key => self.key.as_ref(),
            LimitScope::Method => self.method.as_ref(),
        }
    }
}

/// Guard policy for one (route, method)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPolicy {
    pub key_authentication: bool,
    pub minimum_level: Option<i32>,
    pub limits: MethodLimits,
}

impl Default for MethodPolicy {
    fn default() -> Self {
        Self {
            key_authentication: true,
            minimum_level: None,
            limits: MethodLimits::default(),
        }
    }
}

impl MethodPolicy {
    /// Policy requiring a key, with no level and no limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy for a method that needs no key
    pub fn public() -> Self {
        Self {
            key_authentication: false,
            ..Self::default()
        }
    }

    pub fn with_minimum_level(mut self, level: i32) -> Self {
        self.minimum_level = Some(level);
        self
    }

    pub fn with_key_limit(mut self, setting: impl Into<LimitSetting>) -> Self {
        self.limits.key = Some(setting.into());
        self
    }

    pub fn with_method_limit(mut self, setting: impl Into<LimitSetting>) -> Self {
        self.limits.method = Some(setting.into());
        self
    }

    pub fn has_limits(&self) -> bool {
        !self.limits.is_empty()
    }
}
