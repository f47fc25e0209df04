//! Domain layer - keys, ledger, policies and guard decisions

pub mod api_key;
pub mod api_log;
pub mod clock;
pub mod error;
pub mod guard;
pub mod policy;
pub mod rate_limit;

pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyValidationError};
pub use api_log::{ApiLogEntry, ApiLogEntryId, ApiLogRepository, LogCountQuery};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DomainError;
pub use guard::{
    Admission, GuardError, GuardOutcome, GuardRequest, Rejection, StoreKind, UnauthorizedReason,
};
pub use policy::{
    ConfigurationWarning, LimitRule, LimitScope, LimitSetting, LimitWindow, MethodLimits,
    MethodPolicy, PolicyDefinition, PolicyRegistry, RouteKey, StaticPolicyRegistry,
};
pub use rate_limit::{LimitDecision, LimitRejection, RateLimiter};
