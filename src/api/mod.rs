//! API layer - guard middleware, health endpoints and sample routes

pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod v1;

pub use middleware::{api_guard_middleware, GuardedKey, RequestedIncludes, RequireApiKey};
pub use router::{create_router, create_router_with};
pub use state::{AppState, RequestSettings};
