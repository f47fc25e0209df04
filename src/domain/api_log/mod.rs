//! Request ledger domain

mod entity;
mod repository;

pub use entity::{ApiLogEntry, ApiLogEntryId};
#[cfg(test)]
pub use repository::MockApiLogRepository;
pub use repository::{ApiLogRepository, LogCountQuery};
