//! Guard engine wiring keys, ledger and policies together

mod engine;

pub use engine::{GuardEngine, GuardSettings};
