use super::StoreResult;
use chrono::{DateTime, Utc};
use resguard_types::{PersistedState, SnapshotName};
use serde::{Deserialize, Serialize};

/// Listing entry for a named snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub name: SnapshotName,
    pub created_at: DateTime<Utc>,
}

/// Persistence backend for ledger snapshots.
///
/// Stores only hold copies; the ledger owns the live state. Calls are made
/// while the ledger lock is held, so implementations must not call back into
/// the ledger.
pub trait StateStore: Send + Sync {
    /// Overwrite the current state.
    fn save(&self, state: &PersistedState) -> StoreResult<()>;

    /// Read the current state, `None` if nothing was saved yet.
    fn load(&self) -> StoreResult<Option<PersistedState>>;

    /// Write a named snapshot, replacing one with the same name.
    fn save_named(&self, name: &SnapshotName, state: &PersistedState) -> StoreResult<()>;

    /// Read a named snapshot, `None` if it does not exist.
    fn load_named(&self, name: &SnapshotName) -> StoreResult<Option<PersistedState>>;

    /// List named snapshots newest-first.
    fn list_snapshots(&self) -> StoreResult<Vec<SnapshotInfo>>;
}

/// Builds a listing entry from a stored snapshot.
pub(crate) fn snapshot_info(fallback: &SnapshotName, state: &PersistedState) -> SnapshotInfo {
    SnapshotInfo {
        name: state.snapshot_name.clone().unwrap_or_else(|| fallback.clone()),
        created_at: state.snapshot_time.unwrap_or(state.saved_at),
    }
}

/// Newest first, ties broken by name.
pub(crate) fn sort_newest_first(infos: &mut [SnapshotInfo]) {
    infos.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.name.cmp(&b.name))
    });
}
