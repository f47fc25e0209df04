//! Guard request, outcome and failure types

mod error;
mod outcome;
mod request;

pub use error::{GuardError, StoreKind};
pub use outcome::{Admission, GuardOutcome, Rejection, UnauthorizedReason};
pub use request::{GuardRequest, REDACTED};
