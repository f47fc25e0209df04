//! Guard engine
//!
//! Runs one request through the guard stages in order and stops at the first
//! one that fails:
//!
//! 1. resolve the policy for the route and method
//! 2. authenticate the key (when the policy requires one)
//! 3. check the key level
//! 4. check the key-scoped limit
//! 5. check the method-scoped limit
//! 6. append to the request ledger (authenticated requests, logging enabled)
//!
//! Ledger counts and appends are separate store calls. Two concurrent
//! requests under the same key can both pass the count before either
//! appends, so a limit may be overshot by up to the number of in-flight
//! requests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::api_log::{ApiLogEntry, ApiLogRepository, LogCountQuery};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::guard::{
    Admission, GuardError, GuardOutcome, GuardRequest, Rejection, StoreKind, UnauthorizedReason,
};
use crate::domain::policy::{LimitScope, LimitSetting, MethodPolicy, PolicyRegistry};
use crate::domain::rate_limit::{LimitDecision, RateLimiter};
use crate::domain::DomainError;

/// Runtime settings of the guard
#[derive(Debug, Clone)]
pub struct GuardSettings {
    /// Header carrying the key
    pub key_header_name: String,
    /// Query or body parameter carrying the key when the header is absent
    pub key_parameter_name: String,
    /// Whether admitted requests are written to the ledger
    pub logging_enabled: bool,
    /// Upper bound on each store call
    pub store_timeout: Option<Duration>,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            key_header_name: "key".to_string(),
            key_parameter_name: "key".to_string(),
            logging_enabled: true,
            store_timeout: None,
        }
    }
}

/// Why a request stopped before admission
enum Halt {
    Reject(Rejection),
    Fail(GuardError),
}

impl From<Rejection> for Halt {
    fn from(rejection: Rejection) -> Self {
        Self::Reject(rejection)
    }
}

impl From<GuardError> for Halt {
    fn from(error: GuardError) -> Self {
        Self::Fail(error)
    }
}

/// Authentication, authorization and rate limiting for inbound requests
pub struct GuardEngine {
    keys: Arc<dyn ApiKeyRepository>,
    ledger: Arc<dyn ApiLogRepository>,
    policies: Arc<dyn PolicyRegistry>,
    clock: Arc<dyn Clock>,
    settings: GuardSettings,
}

impl std::fmt::Debug for GuardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl GuardEngine {
    /// Create an engine over the given stores
    ///
    /// Policy problems are reported here, once, rather than on every request.
    pub fn new(
        keys: Arc<dyn ApiKeyRepository>,
        ledger: Arc<dyn ApiLogRepository>,
        policies: Arc<dyn PolicyRegistry>,
        settings: GuardSettings,
    ) -> Self {
        let engine = Self {
            keys,
            ledger,
            policies,
            clock: Arc::new(SystemClock),
            settings,
        };
        engine.report_configuration();
        engine
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.settings
    }

    fn report_configuration(&self) {
        for warning in self.policies.diagnostics() {
            warn!(route = %warning.route, "Policy configuration: {}", warning.message);
        }

        if !self.settings.logging_enabled {
            for (route, _) in self
                .policies
                .policies()
                .into_iter()
                .filter(|(_, policy)| policy.has_limits())
            {
                warn!(
                    route = %route,
                    "Limits are declared but request logging is disabled; they will never trigger"
                );
            }
        }
    }

    /// Decide whether a request may proceed
    ///
    /// Rejections are `Ok(GuardOutcome::Rejected)`. `Err` means a store could
    /// not be consulted and no decision was made.
    pub async fn check(&self, request: &GuardRequest) -> Result<GuardOutcome, GuardError> {
        match self.run(request).await {
            Ok(admission) => Ok(GuardOutcome::Admitted(admission)),
            Err(Halt::Reject(rejection)) => {
                debug!(
                    route = request.route.as_deref().unwrap_or("-"),
                    method = %request.http_method,
                    %rejection,
                    "Request rejected"
                );
                Ok(GuardOutcome::Rejected(rejection))
            }
            Err(Halt::Fail(e)) => {
                error!(
                    route = request.route.as_deref().unwrap_or("-"),
                    method = %request.http_method,
                    error = %e,
                    "Guard could not reach a decision"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, request: &GuardRequest) -> Result<Admission, Halt> {
        let route = request
            .route
            .as_deref()
            .ok_or(Rejection::MethodNotAllowed)?;
        let method = request.http_method.as_str();

        let fallback = MethodPolicy::default();
        let policy = self.policies.lookup(route, method).unwrap_or(&fallback);

        let api_key = if policy.key_authentication {
            Some(self.authenticate(request).await?)
        } else {
            None
        };

        if let (Some(key), Some(required_level)) = (&api_key, policy.minimum_level) {
            if !key.meets_level(required_level) {
                debug!(key_id = %key.id(), level = key.level(), required_level, "Key level too low");
                return Err(Rejection::Forbidden {
                    required_level,
                    actual_level: key.level(),
                }
                .into());
            }
        }

        match &api_key {
            Some(key) if key.ignores_limits() => {
                if policy.has_limits() {
                    debug!(key_id = %key.id(), route, method, "Key ignores limits");
                }
            }
            _ => {
                if let Some(key) = &api_key {
                    self.enforce(LimitScope::Key, policy, route, method, Some(key.id()))
                        .await?;
                }
                self.enforce(LimitScope::Method, policy, route, method, None)
                    .await?;
            }
        }

        let logged = match &api_key {
            Some(key) if self.settings.logging_enabled => {
                self.record(request, route, method, key).await?;
                true
            }
            _ => false,
        };

        Ok(Admission {
            api_key,
            route: route.to_string(),
            logged,
        })
    }

    fn extract_key<'a>(&self, request: &'a GuardRequest) -> Option<&'a str> {
        let non_empty = |value: &'a str| Some(value).filter(|v| !v.trim().is_empty());

        request
            .header(&self.settings.key_header_name)
            .and_then(non_empty)
            .or_else(|| {
                request
                    .param(&self.settings.key_parameter_name)
                    .and_then(non_empty)
            })
    }

    async fn authenticate(&self, request: &GuardRequest) -> Result<ApiKey, Halt> {
        let secret = self
            .extract_key(request)
            .ok_or(Rejection::Unauthorized(UnauthorizedReason::MissingKey))?;

        let key = self
            .call_store(StoreKind::KeyStore, self.keys.find_by_key(secret))
            .await?;

        key.ok_or_else(|| Rejection::Unauthorized(UnauthorizedReason::UnknownKey).into())
    }

    /// Apply one scope's limit
    ///
    /// The clock is read here so each scope sees its own window.
    async fn enforce(
        &self,
        scope: LimitScope,
        policy: &MethodPolicy,
        route: &str,
        method: &str,
        key_id: Option<&ApiKeyId>,
    ) -> Result<(), Halt> {
        let setting = policy.limits.get(scope);

        let count = match setting.and_then(LimitSetting::rule) {
            Some(rule) => {
                let (from, to) = RateLimiter::counting_window(rule, self.clock.now());
                let mut query = LogCountQuery::for_method(route, method, from, to);
                if let Some(id) = key_id {
                    query = query.with_api_key(id.clone());
                }
                self.call_store(StoreKind::Ledger, self.ledger.count(&query))
                    .await?
            }
            None => 0,
        };

        match RateLimiter::evaluate(scope, setting, count) {
            LimitDecision::Admit => Ok(()),
            LimitDecision::Misconfigured { reason } => {
                debug!(%scope, route, method, %reason, "Ignoring misconfigured limit");
                Ok(())
            }
            LimitDecision::Reject(rejection) => {
                match key_id {
                    Some(id) => warn!(
                        key_id = %id,
                        route,
                        method,
                        limit = rejection.limit,
                        count = rejection.count,
                        "API key reached its limit"
                    ),
                    None => warn!(
                        route,
                        method,
                        limit = rejection.limit,
                        count = rejection.count,
                        "Method reached its limit"
                    ),
                }

                Err(match scope {
                    LimitScope::Key => Rejection::KeyLimitExceeded(rejection),
                    LimitScope::Method => Rejection::MethodLimitExceeded(rejection),
                }
                .into())
            }
        }
    }

    async fn record(
        &self,
        request: &GuardRequest,
        route: &str,
        method: &str,
        key: &ApiKey,
    ) -> Result<(), GuardError> {
        let entry = ApiLogEntry::new(Some(key.id().clone()), route, method, self.clock.now())
            .with_params(request.audit_params(&self.settings.key_parameter_name))
            .with_ip_address(request.ip_address.clone());

        self.call_store(StoreKind::Ledger, self.ledger.append(entry))
            .await
    }

    /// Run a store call under the configured timeout
    async fn call_store<T, F>(&self, store: StoreKind, call: F) -> Result<T, GuardError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let result = match self.settings.store_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GuardError::Timeout {
                    store,
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => call.await,
        };

        result.map_err(|source| GuardError::Store { store, source })
    }

    /// Probe both stores
    pub async fn ping_stores(&self) -> Vec<(StoreKind, Result<(), GuardError>)> {
        vec![
            (
                StoreKind::KeyStore,
                self.call_store(StoreKind::KeyStore, self.keys.ping()).await,
            ),
            (
                StoreKind::Ledger,
                self.call_store(StoreKind::Ledger, self.ledger.ping()).await,
            ),
        ]
    }
}
