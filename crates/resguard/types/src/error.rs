use thiserror::Error;

/// Errors raised while parsing or validating shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid process id '{id}': {reason}")]
    InvalidProcessId { id: String, reason: &'static str },

    #[error("unknown resource kind '{0}'")]
    UnknownResourceKind(String),

    #[error("resource vector is missing kind '{0}'")]
    MissingResourceKind(String),

    #[error("invalid snapshot name '{name}': {reason}")]
    InvalidSnapshotName { name: String, reason: &'static str },

    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

/// Coarse failure class shared by every ResGuard error type.
///
/// Validation and safety failures never change state. Persistence failures
/// leave the in-memory ledger untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Safety,
    Persistence,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Safety => "safety",
            Self::Persistence => "persistence",
        };
        f.write_str(label)
    }
}
