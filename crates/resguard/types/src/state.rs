use crate::error::TypesError;
use crate::history::HistoryEntry;
use crate::process::{ProcessId, ProcessInfo, ProcessStatus};
use crate::vector::ResourceVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Current on-disk schema. Bump on any incompatible layout change.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Deep copy of the ledger handed to observers and persisted by stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub total: ResourceVector,
    pub available: ResourceVector,
    /// Registration order; the safety check scans processes in this order.
    pub registration_order: Vec<ProcessId>,
    pub max_claim: BTreeMap<ProcessId, ResourceVector>,
    pub allocation: BTreeMap<ProcessId, ResourceVector>,
    pub need: BTreeMap<ProcessId, ResourceVector>,
    pub process_info: BTreeMap<ProcessId, ProcessInfo>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl SystemState {
    /// A state with no processes and every unit available.
    pub fn empty(total: ResourceVector) -> Self {
        Self {
            total,
            available: total,
            registration_order: Vec::new(),
            max_claim: BTreeMap::new(),
            allocation: BTreeMap::new(),
            need: BTreeMap::new(),
            process_info: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn process_count(&self) -> usize {
        self.registration_order.len()
    }

    pub fn contains(&self, pid: &ProcessId) -> bool {
        self.max_claim.contains_key(pid)
    }

    /// Sum of all allocations, `None` on overflow.
    pub fn allocated(&self) -> Option<ResourceVector> {
        ResourceVector::checked_sum(self.allocation.values())
    }

    /// Verifies the structural invariants a loaded snapshot must satisfy.
    ///
    /// Checks that every per-process map covers the same ids as the
    /// registration order, `allocation + need == max_claim`,
    /// `max_claim <= total`, and `available + Σ allocation == total`.
    /// Safety is not checked here.
    pub fn check_consistency(&self) -> Result<(), TypesError> {
        let ordered: BTreeSet<&ProcessId> = self.registration_order.iter().collect();
        if ordered.len() != self.registration_order.len() {
            return Err(inconsistent("registration order contains duplicates"));
        }

        let same_keys = |keys: Vec<&ProcessId>| keys.into_iter().eq(ordered.iter().copied());
        if !same_keys(self.max_claim.keys().collect()) {
            return Err(inconsistent("max_claim does not match registered processes"));
        }
        if !same_keys(self.allocation.keys().collect()) {
            return Err(inconsistent("allocation does not match registered processes"));
        }
        if !same_keys(self.need.keys().collect()) {
            return Err(inconsistent("need does not match registered processes"));
        }
        if !same_keys(self.process_info.keys().collect()) {
            return Err(inconsistent("process_info does not match registered processes"));
        }

        for pid in &self.registration_order {
            let max_claim = &self.max_claim[pid];
            let derived = self.allocation[pid].checked_add(&self.need[pid]);
            if derived.as_ref() != Some(max_claim) {
                return Err(inconsistent(format!(
                    "allocation + need != max_claim for '{pid}'"
                )));
            }
            if let Some((kind, claim, total)) = max_claim.first_excess(&self.total) {
                return Err(inconsistent(format!(
                    "'{pid}' claims {claim} {kind} but total is {total}"
                )));
            }
            if self.process_info[pid].status == ProcessStatus::Removed {
                return Err(inconsistent(format!("'{pid}' is marked removed")));
            }
        }

        let accounted = self
            .allocated()
            .and_then(|allocated| allocated.checked_add(&self.available));
        if accounted != Some(self.total) {
            return Err(inconsistent("available + allocated != total"));
        }

        Ok(())
    }
}

fn inconsistent(reason: impl Into<String>) -> TypesError {
    TypesError::InconsistentState(reason.into())
}

/// Name of a persisted snapshot: 1-64 ASCII letters, digits, `_` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotName(String);

impl SnapshotName {
    pub const MAX_LEN: usize = 64;

    pub fn new(name: impl Into<String>) -> Result<Self, TypesError> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.len() > Self::MAX_LEN {
            Some("longer than 64 characters")
        } else if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            Some("only letters, digits, '_' and '-' are allowed")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TypesError::InvalidSnapshotName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SnapshotName {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SnapshotName {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SnapshotName> for String {
    fn from(name: SnapshotName) -> Self {
        name.0
    }
}

/// Versioned envelope written by state stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<SnapshotName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub state: SystemState,
}

impl PersistedState {
    /// Wraps `state` for saving, stamped with the current time.
    pub fn capture(state: SystemState, snapshot_name: Option<SnapshotName>) -> Self {
        let saved_at = Utc::now();
        let snapshot_time = snapshot_name.as_ref().map(|_| saved_at);
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at,
            snapshot_name,
            snapshot_time,
            state,
        }
    }

    /// Schema and consistency checks applied before a snapshot is installed.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(inconsistent(format!(
                "unsupported schema version {} (expected {SNAPSHOT_SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        self.state.check_consistency()
    }
}
