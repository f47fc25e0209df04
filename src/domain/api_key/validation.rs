//! API Key validation utilities

use thiserror::Error;

/// Errors that can occur while validating key records
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("API key ID cannot be empty")]
    EmptyId,

    #[error("API key ID exceeds maximum length of {0} characters")]
    IdTooLong(usize),

    #[error("API key ID contains invalid character: '{0}'. Only alphanumeric characters, hyphens and underscores are allowed")]
    InvalidCharacter(char),

    #[error("API key secret cannot be empty")]
    EmptySecret,

    #[error("API key secret exceeds maximum length of {0} characters")]
    SecretTooLong(usize),

    #[error("API key secret cannot contain whitespace")]
    WhitespaceInSecret,
}

const MAX_API_KEY_ID_LENGTH: usize = 64;
const MAX_API_KEY_SECRET_LENGTH: usize = 255;

/// Validate an API key ID
///
/// IDs are stable identifiers referenced by ledger entries, so they are kept
/// to alphanumerics, hyphens and underscores.
pub fn validate_api_key_id(id: &str) -> Result<(), ApiKeyValidationError> {
    if id.is_empty() {
        return Err(ApiKeyValidationError::EmptyId);
    }

    if id.len() > MAX_API_KEY_ID_LENGTH {
        return Err(ApiKeyValidationError::IdTooLong(MAX_API_KEY_ID_LENGTH));
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(ApiKeyValidationError::InvalidCharacter(c));
    }

    Ok(())
}

/// Validate an API key secret
///
/// Secrets travel in a header or a request parameter, so they must be
/// non-empty and free of whitespace.
pub fn validate_api_key_secret(secret: &str) -> Result<(), ApiKeyValidationError> {
    if secret.is_empty() {
        return Err(ApiKeyValidationError::EmptySecret);
    }

    if secret.len() > MAX_API_KEY_SECRET_LENGTH {
        return Err(ApiKeyValidationError::SecretTooLong(MAX_API_KEY_SECRET_LENGTH));
    }

    if secret.chars().any(char::is_whitespace) {
        return Err(ApiKeyValidationError::WhitespaceInSecret);
    }

    Ok(())
}
