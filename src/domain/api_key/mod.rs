//! API Key domain
//!
//! Key records and the store trait the guard authenticates against.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKey, ApiKeyId};
#[cfg(test)]
pub use repository::MockApiKeyRepository;
pub use repository::ApiKeyRepository;
pub use validation::{validate_api_key_id, validate_api_key_secret, ApiKeyValidationError};
