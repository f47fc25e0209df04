//! Guard middleware
//!
//! Translates an axum request into a `GuardRequest`, runs the engine and
//! either forwards the request with the admission attached or answers with
//! the mapped error.

use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, FromRequest, MatchedPath, Query, Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
    Form,
};
use serde_json::Value;
use tracing::debug;

use super::auth::RequestedIncludes;
use crate::api::state::{AppState, RequestSettings};
use crate::api::types::ApiError;
use crate::domain::guard::{GuardOutcome, GuardRequest};

type Params = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Form,
    Json,
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let mime = content_type.split(';').next()?.trim();

        if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(Self::Form)
        } else if mime.eq_ignore_ascii_case("application/json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// Guard every request of the router it is layered on
pub async fn api_guard_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut request, body_params) =
        read_body_params(request, state.request.max_body_bytes).await?;
    let guard_request = build_guard_request(&request, body_params, &state.request);
    let includes =
        RequestedIncludes::parse(guard_request.param(&state.request.include_parameter_name));

    match state.guard.check(&guard_request).await? {
        GuardOutcome::Admitted(admission) => {
            request.extensions_mut().insert(admission);
            request.extensions_mut().insert(includes);
            Ok(next.run(request).await)
        }
        GuardOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// Buffer form and JSON bodies so their fields can carry the key
///
/// The body is put back untouched for the handler.
async fn read_body_params(request: Request, limit: usize) -> Result<(Request, Params), ApiError> {
    let Some(kind) = BodyKind::of(request.headers()) else {
        return Ok((request, Params::new()));
    };

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {}", e)))?;

    let params = match kind {
        BodyKind::Form => form_params(bytes.clone()).await,
        BodyKind::Json => json_params(&bytes),
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), params))
}

async fn form_params(bytes: Bytes) -> Params {
    let request = match Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(bytes))
    {
        Ok(request) => request,
        Err(_) => return Params::new(),
    };

    match Form::<Params>::from_request(request, &()).await {
        Ok(Form(params)) => params,
        Err(e) => {
            debug!(error = %e, "Ignoring unparseable form body");
            Params::new()
        }
    }
}

/// Top-level scalar fields of a JSON object
fn json_params(bytes: &[u8]) -> Params {
    let Ok(object) = serde_json::from_slice::<serde_json::Map<String, Value>>(bytes) else {
        return Params::new();
    };

    object
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name, s)),
            Value::Number(n) => Some((name, n.to_string())),
            Value::Bool(b) => Some((name, b.to_string())),
            _ => None,
        })
        .collect()
}

fn build_guard_request(
    request: &Request,
    body_params: Params,
    settings: &RequestSettings,
) -> GuardRequest {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    let query = Query::<Params>::try_from_uri(request.uri())
        .map(|Query(params)| params)
        .unwrap_or_default();

    // Body fields override query fields of the same name
    let mut guard_request = GuardRequest::new(route, request.method().as_str())
        .with_params(query)
        .with_params(body_params);

    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            guard_request = guard_request.with_header(name, value);
        }
    }

    if let Some(ip) = client_ip(request, settings.trust_forwarded_for) {
        guard_request = guard_request.with_ip_address(ip);
    }

    guard_request
}

fn client_ip(request: &Request, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());

        if let Some(hop) = forwarded {
            return Some(hop.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
