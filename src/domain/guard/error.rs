//! Guard failures

use thiserror::Error;

use crate::domain::DomainError;

/// Store the guard depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    KeyStore,
    Ledger,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyStore => write!(f, "key store"),
            Self::Ledger => write!(f, "request ledger"),
        }
    }
}

/// The guard could not reach a decision
///
/// Never an admit or a reject: the caller must treat the request as failed.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("{store} unavailable: {source}")]
    Store {
        store: StoreKind,
        #[source]
        source: DomainError,
    },

    #[error("{store} did not respond within {timeout_ms}ms")]
    Timeout { store: StoreKind, timeout_ms: u64 },
}

impl GuardError {
    pub fn store(&self) -> StoreKind {
        match self {
            Self::Store { store, .. } | Self::Timeout { store, .. } => *store,
        }
    }
}
