//! Guard error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::guard::{GuardError, Rejection};

/// 431 is reused as "unwilling to process" for key-scoped throttling
const UNWILLING_TO_PROCESS: StatusCode = StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE;

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "GEN-WRONG-ARGS")]
    WrongArgs,
    #[serde(rename = "GEN-UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "GEN-FORBIDDEN")]
    Forbidden,
    #[serde(rename = "GEN-METHOD-NOT-ALLOWED")]
    MethodNotAllowed,
    #[serde(rename = "GEN-UNWILLING-TO-PROCESS")]
    UnwillingToProcess,
    #[serde(rename = "GEN-LIMIT-REACHED")]
    LimitReached,
    #[serde(rename = "GEN-SERVICE-UNAVAILABLE")]
    ServiceUnavailable,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::WrongArgs => "GEN-WRONG-ARGS",
            Self::Unauthorized => "GEN-UNAUTHORIZED",
            Self::Forbidden => "GEN-FORBIDDEN",
            Self::MethodNotAllowed => "GEN-METHOD-NOT-ALLOWED",
            Self::UnwillingToProcess => "GEN-UNWILLING-TO-PROCESS",
            Self::LimitReached => "GEN-LIMIT-REACHED",
            Self::ServiceUnavailable => "GEN-SERVICE-UNAVAILABLE",
        };
        write!(f, "{}", code)
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: ErrorCode,
    pub http_code: u16,
    pub message: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    code,
                    http_code: status.as_u16(),
                    message: message.into(),
                },
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::WrongArgs, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::MethodNotAllowed,
            message,
        )
    }

    /// Key-scoped limit reached
    pub fn unwilling_to_process(message: impl Into<String>) -> Self {
        Self::new(UNWILLING_TO_PROCESS, ErrorCode::UnwillingToProcess, message)
    }

    /// Method-scoped limit reached
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, ErrorCode::LimitReached, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ServiceUnavailable,
            message,
        )
    }

    pub fn code(&self) -> ErrorCode {
        self.response.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::MethodNotAllowed => Self::method_not_allowed("Method not allowed"),
            Rejection::Unauthorized(_) => Self::unauthorized("Unauthorized"),
            Rejection::Forbidden { .. } => Self::forbidden("Forbidden"),
            Rejection::KeyLimitExceeded(_) => {
                Self::unwilling_to_process("You have reached the limit for using this API.")
            }
            Rejection::MethodLimitExceeded(_) => {
                Self::rate_limited("The limit for using this API method has been reached")
            }
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        Self::unavailable(format!("Service unavailable: {}", err.store()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.code, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guard::{StoreKind, UnauthorizedReason};
    use crate::domain::policy::{LimitScope, LimitWindow};
    use crate::domain::rate_limit::LimitRejection;
    use crate::domain::DomainError;

    fn limit_rejection(scope: LimitScope) -> LimitRejection {
        LimitRejection {
            scope,
            limit: 10,
            window: LimitWindow::minutes(1).unwrap(),
            count: 10,
        }
    }

    #[test]
    fn test_rejection_status_mapping() {
        let cases = [
            (Rejection::MethodNotAllowed, 405, ErrorCode::MethodNotAllowed),
            (
                Rejection::Unauthorized(UnauthorizedReason::UnknownKey),
                401,
                ErrorCode::Unauthorized,
            ),
            (
                Rejection::Forbidden {
                    required_level: 5,
                    actual_level: 1,
                },
                403,
                ErrorCode::Forbidden,
            ),
            (
                Rejection::KeyLimitExceeded(limit_rejection(LimitScope::Key)),
                431,
                ErrorCode::UnwillingToProcess,
            ),
            (
                Rejection::MethodLimitExceeded(limit_rejection(LimitScope::Method)),
                429,
                ErrorCode::LimitReached,
            ),
        ];

        for (rejection, status, code) in cases {
            let err = ApiError::from(rejection);
            assert_eq!(err.status.as_u16(), status);
            assert_eq!(err.response.error.http_code, status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_store_failure_is_unavailable() {
        let err = ApiError::from(GuardError::Store {
            store: StoreKind::Ledger,
            source: DomainError::storage("connection reset"),
        });

        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert!(!err.response.error.message.contains("connection reset"));
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::from(Rejection::MethodLimitExceeded(limit_rejection(
            LimitScope::Method,
        )));
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["code"], "GEN-LIMIT-REACHED");
        assert_eq!(json["error"]["http_code"], 429);
        assert_eq!(
            json["error"]["message"],
            "The limit for using this API method has been reached"
        );
    }

    #[test]
    fn test_code_display_matches_serialization() {
        let code = ErrorCode::UnwillingToProcess;
        assert_eq!(
            serde_json::to_string(&code).unwrap(),
            format!("\"{}\"", code)
        );
    }
}
