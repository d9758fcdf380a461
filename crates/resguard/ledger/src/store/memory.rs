//! In-memory state store.
//!
//! Snapshots are kept as serialized JSON so the same encode/decode path as the
//! file store is exercised. Useful for tests and embedded use.

use super::traits::{snapshot_info, sort_newest_first, SnapshotInfo, StateStore};
use super::{StoreError, StoreResult};
use parking_lot::RwLock;
use resguard_types::{PersistedState, SnapshotName};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    current: RwLock<Option<String>>,
    snapshots: RwLock<BTreeMap<SnapshotName, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace stored JSON verbatim. `None` targets the current state.
    pub fn put_raw(&self, name: Option<&SnapshotName>, json: impl Into<String>) {
        match name {
            Some(name) => {
                self.snapshots.write().insert(name.clone(), json.into());
            }
            None => *self.current.write() = Some(json.into()),
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().len()
    }
}

fn decode(json: Option<&String>) -> StoreResult<Option<PersistedState>> {
    json.map(|raw| serde_json::from_str::<PersistedState>(raw).map_err(StoreError::from))
        .transpose()
}

impl StateStore for InMemoryStateStore {
    fn save(&self, state: &PersistedState) -> StoreResult<()> {
        let json = serde_json::to_string(state)?;
        *self.current.write() = Some(json);
        Ok(())
    }

    fn load(&self) -> StoreResult<Option<PersistedState>> {
        decode(self.current.read().as_ref())
    }

    fn save_named(&self, name: &SnapshotName, state: &PersistedState) -> StoreResult<()> {
        let json = serde_json::to_string(state)?;
        self.snapshots.write().insert(name.clone(), json);
        Ok(())
    }

    fn load_named(&self, name: &SnapshotName) -> StoreResult<Option<PersistedState>> {
        decode(self.snapshots.read().get(name))
    }

    fn list_snapshots(&self) -> StoreResult<Vec<SnapshotInfo>> {
        let snapshots = self.snapshots.read();
        let mut infos = Vec::with_capacity(snapshots.len());
        for (name, raw) in snapshots.iter() {
            if let Ok(state) = serde_json::from_str::<PersistedState>(raw) {
                infos.push(snapshot_info(name, &state));
            }
        }
        sort_newest_first(&mut infos);
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resguard_types::{ResourceVector, SystemState};

    fn persisted(name: Option<&str>) -> PersistedState {
        PersistedState::capture(
            SystemState::empty(ResourceVector::uniform(10)),
            name.map(|n| SnapshotName::new(n).unwrap()),
        )
    }

    #[test]
    fn load_before_save_is_none() {
        let store = InMemoryStateStore::new();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saves_current_and_named_separately() {
        let store = InMemoryStateStore::new();
        let current = persisted(None);
        let named = persisted(Some("first"));
        let name = SnapshotName::new("first").unwrap();

        store.save(&current).unwrap();
        store.save_named(&name, &named).unwrap();

        assert_eq!(store.load().unwrap(), Some(current));
        assert_eq!(store.load_named(&name).unwrap(), Some(named));
        assert_eq!(store.snapshot_count(), 1);
    }

    #[test]
    fn corrupted_json_is_a_serialization_error() {
        let store = InMemoryStateStore::new();
        store.put_raw(None, "{not json");
        assert!(matches!(
            store.load(),
            Err(StoreError::Serialization(_))
        ));
    }
}
