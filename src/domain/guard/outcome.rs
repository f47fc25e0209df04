//! Guard decisions

use crate::domain::api_key::ApiKey;
use crate::domain::rate_limit::LimitRejection;

/// Why authentication failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// No key in the header or the parameter
    MissingKey,
    /// The key store has no such key
    UnknownKey,
}

/// Terminal rejection of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The request did not resolve to a method
    MethodNotAllowed,
    Unauthorized(UnauthorizedReason),
    Forbidden {
        required_level: i32,
        actual_level: i32,
    },
    /// The caller's own limit was hit
    KeyLimitExceeded(LimitRejection),
    /// The method's limit across all callers was hit
    MethodLimitExceeded(LimitRejection),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MethodNotAllowed => write!(f, "method not allowed"),
            Self::Unauthorized(UnauthorizedReason::MissingKey) => write!(f, "missing API key"),
            Self::Unauthorized(UnauthorizedReason::UnknownKey) => write!(f, "unknown API key"),
            Self::Forbidden {
                required_level,
                actual_level,
            } => write!(
                f,
                "key level {} is below required level {}",
                actual_level, required_level
            ),
            Self::KeyLimitExceeded(r) => {
                write!(f, "key limit of {} per {} reached", r.limit, r.window)
            }
            Self::MethodLimitExceeded(r) => {
                write!(f, "method limit of {} per {} reached", r.limit, r.window)
            }
        }
    }
}

/// A request that passed every stage
#[derive(Debug, Clone)]
pub struct Admission {
    /// The authenticated key; `None` on routes without key authentication
    pub api_key: Option<ApiKey>,
    pub route: String,
    /// Whether a ledger entry was written for this request
    pub logged: bool,
}

#[derive(Debug, Clone)]
pub enum GuardOutcome {
    Admitted(Admission),
    Rejected(Rejection),
}

impl GuardOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Admitted(_) => None,
        }
    }

    pub fn admission(&self) -> Option<&Admission> {
        match self {
            Self::Admitted(admission) => Some(admission),
            Self::Rejected(_) => None,
        }
    }
}
