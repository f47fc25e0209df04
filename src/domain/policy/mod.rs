//! Guard policies
//!
//! Per-method authentication, level and limit settings, the window type they
//! use, and the registry the guard reads them from.

mod definition;
mod entity;
mod registry;
mod window;

pub use definition::{LimitDefinition, LimitsDefinition, PolicyDefinition, ANY_METHOD};
pub use entity::{LimitRule, LimitScope, LimitSetting, MethodLimits, MethodPolicy};
pub use registry::{ConfigurationWarning, PolicyRegistry, RouteKey, StaticPolicyRegistry};
pub use window::{LimitWindow, WindowParseError, MAX_WINDOW_SECONDS};
