//! Request ledger implementations

mod in_memory;
mod postgres_repository;

pub use in_memory::InMemoryApiLogRepository;
pub use postgres_repository::PostgresApiLogRepository;
