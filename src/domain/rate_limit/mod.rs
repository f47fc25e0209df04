//! Rate limit decisions
//!
//! Pure evaluation of a scope's limit against a ledger count. Counting itself
//! is done by the guard engine against the request ledger.

mod evaluator;

pub use evaluator::{LimitDecision, LimitRejection, RateLimiter};
