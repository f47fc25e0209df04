//! Infrastructure layer - store adapters, guard engine and logging

pub mod api_key;
pub mod api_log;
pub mod guard;
pub mod logging;
pub mod storage;
