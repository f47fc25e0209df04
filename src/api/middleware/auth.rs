//! Extractors for handlers behind the guard
//!
//! The guard middleware stores the `Admission` and the requested includes in
//! the request extensions; these extractors read them back.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::types::ApiError;
use crate::domain::api_key::ApiKey;
use crate::domain::guard::Admission;

/// Extractor that requires an authenticated key
///
/// Fails with 401 on routes the guard admitted without a key.
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub ApiKey);

impl<S: Send + Sync> FromRequestParts<S> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Admission>()
            .and_then(|admission| admission.api_key.clone())
            .map(RequireApiKey)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// The key the guard resolved, if the route required one
#[derive(Debug, Clone)]
pub struct GuardedKey(pub Option<ApiKey>);

impl<S: Send + Sync> FromRequestParts<S> for GuardedKey {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(GuardedKey(
            parts
                .extensions
                .get::<Admission>()
                .and_then(|admission| admission.api_key.clone()),
        ))
    }
}

/// Relations the caller asked to embed in the response
///
/// Parsed from a comma-separated parameter. Nested names imply their
/// parents: `author.books` also requests `author`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedIncludes(pub Vec<String>);

impl RequestedIncludes {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut includes: Vec<String> = Vec::new();

        for name in raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            let segments: Vec<&str> = name.split('.').collect();
            for depth in 1..=segments.len() {
                let include = segments[..depth].join(".");
                if !includes.contains(&include) {
                    includes.push(include);
                }
            }
        }

        Self(includes)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|include| include == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestedIncludes {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestedIncludes>()
            .cloned()
            .unwrap_or_default())
    }
}
