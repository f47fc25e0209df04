//! Key store implementations

mod postgres_repository;
mod repository;

pub use postgres_repository::PostgresApiKeyRepository;
pub use repository::InMemoryApiKeyRepository;
