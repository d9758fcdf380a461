//! Error types for resguard-engine.
//!
//! Every rejected engine call leaves the engine exactly as it was.

use resguard_types::{ErrorCategory, ProcessId, ResourceKind, TypesError};
use thiserror::Error;

/// Errors raised by [`crate::BankerSafetyEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Process already registered.
    #[error("process '{0}' is already registered")]
    DuplicateProcess(ProcessId),

    /// Process not registered.
    #[error("process '{0}' is not registered")]
    UnknownProcess(ProcessId),

    /// Declared maximum claim exceeds total capacity.
    #[error("claim of {claim} {kind} by '{process}' exceeds total capacity {total}")]
    ClaimExceedsCapacity {
        process: ProcessId,
        kind: ResourceKind,
        claim: u64,
        total: u64,
    },

    /// Request exceeds the remaining need (declared maximum).
    #[error("request of {requested} {kind} by '{process}' exceeds declared maximum (remaining need {need})")]
    ExceedsNeed {
        process: ProcessId,
        kind: ResourceKind,
        requested: u64,
        need: u64,
    },

    /// Request exceeds the available pool.
    #[error("insufficient resources: '{process}' requested {requested} {kind}, {available} available")]
    InsufficientResources {
        process: ProcessId,
        kind: ResourceKind,
        requested: u64,
        available: u64,
    },

    /// Release exceeds the current allocation.
    #[error("release of {requested} {kind} by '{process}' exceeds current allocation {held}")]
    ExceedsAllocation {
        process: ProcessId,
        kind: ResourceKind,
        requested: u64,
        held: u64,
    },

    /// Granting the request would leave the system unsafe; the grant was rolled back.
    #[error("request by '{process}' would leave the system unsafe (could not finish: {})", join(.unfinished))]
    UnsafeState {
        process: ProcessId,
        unfinished: Vec<ProcessId>,
    },

    /// New capacity is below what is currently allocated.
    #[error("capacity {requested} {kind} is below the {allocated} currently allocated")]
    CapacityBelowAllocated {
        kind: ResourceKind,
        requested: u64,
        allocated: u64,
    },

    /// New capacity is below a registered maximum claim.
    #[error("capacity {requested} {kind} is below the claim of {claim} by '{process}'")]
    CapacityBelowClaim {
        kind: ResourceKind,
        requested: u64,
        claim: u64,
        process: ProcessId,
    },

    /// New capacity would leave the system unsafe; the change was rolled back.
    #[error("capacity {requested} {kind} would leave the system unsafe (could not finish: {})", join(.unfinished))]
    UnsafeCapacity {
        kind: ResourceKind,
        requested: u64,
        unfinished: Vec<ProcessId>,
    },

    /// Restored accounts violate an engine invariant.
    #[error("inconsistent engine state: {0}")]
    Inconsistent(String),
}

impl EngineError {
    /// Coarse category of this failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsafeState { .. } | Self::UnsafeCapacity { .. } => ErrorCategory::Safety,
            _ => ErrorCategory::Validation,
        }
    }

    /// Process named by this error, when there is one.
    pub fn process(&self) -> Option<&ProcessId> {
        match self {
            Self::DuplicateProcess(pid) | Self::UnknownProcess(pid) => Some(pid),
            Self::ClaimExceedsCapacity { process, .. }
            | Self::ExceedsNeed { process, .. }
            | Self::InsufficientResources { process, .. }
            | Self::ExceedsAllocation { process, .. }
            | Self::UnsafeState { process, .. }
            | Self::CapacityBelowClaim { process, .. } => Some(process),
            _ => None,
        }
    }
}

impl From<TypesError> for EngineError {
    fn from(err: TypesError) -> Self {
        Self::Inconsistent(err.to_string())
    }
}

fn join(pids: &[ProcessId]) -> String {
    pids.iter()
        .map(ProcessId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_errors_are_safety_category() {
        let err = EngineError::UnsafeState {
            process: ProcessId::new("p1").unwrap(),
            unfinished: vec![ProcessId::new("p1").unwrap(), ProcessId::new("p2").unwrap()],
        };
        assert_eq!(err.category(), ErrorCategory::Safety);
        assert!(err.to_string().contains("p1, p2"));

        let err = EngineError::UnknownProcess(ProcessId::new("ghost").unwrap());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.process().map(ProcessId::as_str), Some("ghost"));
    }
}
