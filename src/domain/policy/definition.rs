//! Declarative policy surface
//!
//! Hosts declare policies in configuration; these types mirror that shape and
//! are turned into `MethodPolicy` values by the registry.

use serde::{Deserialize, Serialize};

use super::entity::{LimitSetting, MethodLimits, MethodPolicy};
use super::window::LimitWindow;

/// Matches every HTTP method of a route
pub const ANY_METHOD: &str = "*";

fn any_method() -> String {
    ANY_METHOD.to_string()
}

fn default_true() -> bool {
    true
}

/// One declared policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDefinition {
    /// Route identifier, e.g. the matched path `/v1/books/{id}`
    pub route: String,
    /// HTTP method, or `*` for every method of the route
    #[serde(default = "any_method")]
    pub method: String,
    #[serde(default = "default_true")]
    pub key_authentication: bool,
    /// Minimum key level
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub limits: LimitsDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsDefinition {
    #[serde(default)]
    pub key: Option<LimitDefinition>,
    #[serde(default)]
    pub method: Option<LimitDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitDefinition {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub window: Option<String>,
}

impl LimitDefinition {
    fn to_setting(&self, default_window: LimitWindow) -> LimitSetting {
        LimitSetting::from_raw(self.limit, self.window.as_deref(), default_window)
    }
}

impl PolicyDefinition {
    pub fn to_policy(&self, default_window: LimitWindow) -> MethodPolicy {
        MethodPolicy {
            key_authentication: self.key_authentication,
            minimum_level: self.level,
            limits: MethodLimits {
                key: self.limits.key.as_ref().map(|l| l.to_setting(default_window)),
                method: self.limits.method.as_ref().map(|l| l.to_setting(default_window)),
            },
        }
    }
}
