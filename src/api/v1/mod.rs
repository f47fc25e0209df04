//! Sample guarded endpoints
//!
//! Real deployments mount their own routers behind the guard; these exist to
//! exercise it end to end.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;

use super::middleware::{GuardedKey, RequestedIncludes, RequireApiKey};
use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub id: String,
    pub level: i32,
    pub ignore_limits: bool,
    pub includes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub pong: bool,
    pub authenticated: bool,
}

/// GET|POST /v1/whoami
pub async fn whoami(
    RequireApiKey(api_key): RequireApiKey,
    RequestedIncludes(includes): RequestedIncludes,
) -> Json<WhoAmIResponse> {
    debug!(key_id = %api_key.id(), "Describing caller key");

    Json(WhoAmIResponse {
        id: api_key.id().to_string(),
        level: api_key.level(),
        ignore_limits: api_key.ignores_limits(),
        includes,
    })
}

/// GET /v1/ping
pub async fn ping(GuardedKey(api_key): GuardedKey) -> Json<PingResponse> {
    Json(PingResponse {
        pong: true,
        authenticated: api_key.is_some(),
    })
}

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/whoami", get(whoami).post(whoami))
        .route("/ping", get(ping))
}
