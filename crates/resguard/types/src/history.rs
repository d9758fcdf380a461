use crate::vector::ResourceVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four audited ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Register,
    Request,
    Release,
    Remove,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Register => "register",
            Self::Request => "request",
            Self::Release => "release",
            Self::Remove => "remove",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure { reason: String },
}

/// One attempted mutating call, successful or not. Entries are never edited.
///
/// `resources` is the max claim for register, the delta for request/release
/// and absent for remove. The process id is kept verbatim even when it failed
/// validation, so rejected inputs stay visible in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub process_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceVector>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl HistoryEntry {
    pub fn success(
        kind: OperationKind,
        process_id: impl Into<String>,
        resources: Option<ResourceVector>,
    ) -> Self {
        Self {
            kind,
            process_id: process_id.into(),
            resources,
            timestamp: Utc::now(),
            outcome: Outcome::Success,
        }
    }

    pub fn failure(
        kind: OperationKind,
        process_id: impl Into<String>,
        resources: Option<ResourceVector>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            process_id: process_id.into(),
            resources,
            timestamp: Utc::now(),
            outcome: Outcome::Failure {
                reason: reason.into(),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }
}
