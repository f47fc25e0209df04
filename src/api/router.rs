use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::api_guard_middleware;
use super::state::AppState;
use super::types::ApiError;
use super::v1;
use crate::domain::guard::Rejection;

/// Create the router with the bundled v1 endpoints behind the guard
pub fn create_router(state: AppState) -> Router {
    create_router_with(state, Router::new().nest("/v1", v1::create_v1_router()))
}

/// Create the router, guarding every route of `protected`
///
/// The guard only runs for requests that reach a method handler. Unknown
/// paths and methods a route does not serve are answered with 405 before
/// any key is looked at. Health endpoints stay outside the guard.
pub fn create_router_with(state: AppState, protected: Router<AppState>) -> Router {
    let guarded = protected
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_guard_middleware,
        ))
        .method_not_allowed_fallback(unresolved_route)
        .fallback(unresolved_route);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .merge(guarded)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn unresolved_route() -> ApiError {
    Rejection::MethodNotAllowed.into()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::RequestSettings;
    use crate::domain::api_key::{ApiKey, ApiKeyId};
    use crate::domain::policy::{LimitRule, LimitWindow, MethodPolicy, StaticPolicyRegistry};
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;
    use crate::infrastructure::api_log::InMemoryApiLogRepository;
    use crate::infrastructure::guard::{GuardEngine, GuardSettings};

    fn key(id: &str, secret: &str, level: i32) -> ApiKey {
        ApiKey::new(ApiKeyId::new(id).unwrap(), secret)
            .unwrap()
            .with_level(level)
    }

    fn rule(limit: u32) -> LimitRule {
        LimitRule::new(limit, LimitWindow::minutes(1).unwrap()).unwrap()
    }

    fn app_with(registry: StaticPolicyRegistry) -> (Router, Arc<InMemoryApiLogRepository>) {
        let keys = InMemoryApiKeyRepository::with_keys([
            key("reader", "secret-reader", 1),
            key("admin", "secret-admin", 10),
        ])
        .unwrap();
        let ledger = Arc::new(InMemoryApiLogRepository::new());

        let engine = GuardEngine::new(
            Arc::new(keys),
            ledger.clone(),
            Arc::new(registry),
            GuardSettings::default(),
        );
        let settings = RequestSettings {
            trust_forwarded_for: true,
            ..RequestSettings::default()
        };

        (
            create_router(AppState::new(Arc::new(engine), settings)),
            ledger,
        )
    }

    fn app() -> (Router, Arc<InMemoryApiLogRepository>) {
        app_with(
            StaticPolicyRegistry::new()
                .with_policy("/v1/ping", "GET", MethodPolicy::public())
                .with_policy("/v1/whoami", "*", MethodPolicy::new()),
        )
    }

    fn get_request(uri: &str, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(secret) = secret {
            builder = builder.header("key", secret);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_not_guarded() {
        let (app, _) = app();

        let response = app
            .oneshot(get_request("/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_checks_stores() {
        let (app, _) = app();

        let response = app.oneshot(get_request("/ready", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admitted_request_reaches_handler() {
        let (app, ledger) = app();

        let response = app
            .oneshot(get_request("/v1/whoami", Some("secret-reader")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "reader");
        assert_eq!(body["level"], 1);

        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].route, "/v1/whoami");
        assert_eq!(entries[0].http_method, "GET");
    }

    #[tokio::test]
    async fn test_missing_key_is_401() {
        let (app, ledger) = app();

        let response = app
            .oneshot(get_request("/v1/whoami", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "GEN-UNAUTHORIZED");
        assert_eq!(body["error"]["http_code"], 401);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_key_in_query_parameter() {
        let (app, ledger) = app();

        let response = app
            .oneshot(get_request("/v1/whoami?key=secret-admin&include=books", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "admin");
        assert_eq!(body["includes"][0], "books");
        assert!(!ledger.entries()[0].params.contains("secret-admin"));
    }

    #[tokio::test]
    async fn test_key_in_json_body() {
        let (app, _) = app();

        let request = Request::builder()
            .method("POST")
            .uri("/v1/whoami")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"key":"secret-reader"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_key_in_form_body() {
        let (app, _) = app();

        let request = Request::builder()
            .method("POST")
            .uri("/v1/whoami")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("key=secret-reader&include=author.books"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["includes"], serde_json::json!(["author", "author.books"]));
    }

    #[tokio::test]
    async fn test_public_route_needs_no_key_and_is_not_logged() {
        let (app, ledger) = app();

        let response = app
            .oneshot(get_request("/v1/ping", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], false);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_level_is_403() {
        let (app, _) = app_with(
            StaticPolicyRegistry::new()
                .with_policy("/v1/whoami", "GET", MethodPolicy::new().with_minimum_level(5)),
        );

        let response = app
            .clone()
            .oneshot(get_request("/v1/whoami", Some("secret-reader")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"]["code"], "GEN-FORBIDDEN");

        let response = app
            .oneshot(get_request("/v1/whoami", Some("secret-admin")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_key_limit_is_431() {
        let (app, ledger) = app_with(
            StaticPolicyRegistry::new()
                .with_policy("/v1/whoami", "GET", MethodPolicy::new().with_key_limit(rule(2))),
        );

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(get_request("/v1/whoami", Some("secret-reader")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(get_request("/v1/whoami", Some("secret-reader")))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 431);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "GEN-UNWILLING-TO-PROCESS");
        assert_eq!(
            body["error"]["message"],
            "You have reached the limit for using this API."
        );

        // Another key still has its own allowance
        let response = app
            .oneshot(get_request("/v1/whoami", Some("secret-admin")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ledger.len(), 3);
    }

    #[tokio::test]
    async fn test_method_limit_is_429() {
        let (app, _) = app_with(
            StaticPolicyRegistry::new()
                .with_policy("/v1/whoami", "GET", MethodPolicy::new().with_method_limit(rule(2))),
        );

        for secret in ["secret-reader", "secret-admin"] {
            let response = app
                .clone()
                .oneshot(get_request("/v1/whoami", Some(secret)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(get_request("/v1/whoami", Some("secret-reader")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "GEN-LIMIT-REACHED"
        );
    }

    #[tokio::test]
    async fn test_forwarded_for_is_recorded() {
        let (app, ledger) = app();

        let request = Request::builder()
            .uri("/v1/whoami")
            .header("key", "secret-reader")
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.2")
            .body(Body::empty())
            .unwrap();

        app.oneshot(request).await.unwrap();

        assert_eq!(
            ledger.entries()[0].ip_address.as_deref(),
            Some("198.51.100.4")
        );
    }

    #[tokio::test]
    async fn test_unserved_method_is_405_before_authentication() {
        let (app, ledger) = app();

        let request = Request::builder()
            .method("DELETE")
            .uri("/v1/ping")
            .header("key", "secret-reader")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "GEN-METHOD-NOT-ALLOWED"
        );
        assert!(ledger.is_empty());

        // No key at all still gets 405 rather than 401
        let request = Request::builder()
            .method("DELETE")
            .uri("/v1/ping")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_405() {
        let (app, ledger) = app();

        let response = app
            .oneshot(get_request("/v1/nothing-here", Some("secret-reader")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "GEN-METHOD-NOT-ALLOWED"
        );
        assert!(ledger.is_empty());
    }
}
