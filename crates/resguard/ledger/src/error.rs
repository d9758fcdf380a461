//! Error types for resguard-ledger.

use crate::store::StoreError;
use resguard_engine::EngineError;
use resguard_types::{ErrorCategory, SnapshotName, TypesError};
use thiserror::Error;

/// Errors returned by [`crate::ResourceLedger`] and its helpers.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The engine refused the operation. State is unchanged.
    #[error(transparent)]
    Rejected(#[from] EngineError),

    /// Malformed input (process id, snapshot name) rejected before reaching the engine.
    #[error(transparent)]
    InvalidInput(#[from] TypesError),

    /// Persistence backend failure.
    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    /// Nothing has been saved yet.
    #[error("no saved state")]
    NoSavedState,

    /// Named snapshot does not exist.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(SnapshotName),

    /// Stored snapshot failed schema or consistency validation.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Invalid ledger configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LedgerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Rejected(err) => err.category(),
            Self::InvalidInput(_) | Self::InvalidConfig(_) => ErrorCategory::Validation,
            Self::Store(_)
            | Self::NoSavedState
            | Self::SnapshotNotFound(_)
            | Self::MalformedSnapshot(_) => {
                ErrorCategory::Persistence
            }
        }
    }

    /// True for engine denials (validation or safety) of a ledger operation.
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
