//! API middleware components

pub mod auth;
pub mod guard;

pub use auth::{GuardedKey, RequestedIncludes, RequireApiKey};
pub use guard::api_guard_middleware;
