//! JSON file state store.
//!
//! Layout under the state directory:
//! - `current_state.json`: the last saved ledger state
//! - `snapshots/<name>.json`: named snapshots
//!
//! Every write goes to a temporary sibling first and is renamed into place, so
//! a crash mid-write never leaves a truncated snapshot behind.

use super::traits::{snapshot_info, sort_newest_first, SnapshotInfo, StateStore};
use super::{StoreError, StoreResult};
use resguard_types::{PersistedState, SnapshotName};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CURRENT_FILE: &str = "current_state.json";
const SNAPSHOT_DIR: &str = "snapshots";

#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Uses `dir` as the state directory. Directories are created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_FILE)
    }

    pub fn snapshot_path(&self, name: &SnapshotName) -> PathBuf {
        self.dir.join(SNAPSHOT_DIR).join(format!("{name}.json"))
    }

    fn write_atomic(&self, path: &Path, state: &PersistedState) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;

        debug!(path = %path.display(), "state written");
        Ok(())
    }

    fn read(&self, path: &Path) -> StoreResult<Option<PersistedState>> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let state = serde_json::from_slice(&raw)?;
        Ok(Some(state))
    }
}

impl StateStore for FileStateStore {
    fn save(&self, state: &PersistedState) -> StoreResult<()> {
        self.write_atomic(&self.current_path(), state)
    }

    fn load(&self) -> StoreResult<Option<PersistedState>> {
        self.read(&self.current_path())
    }

    fn save_named(&self, name: &SnapshotName, state: &PersistedState) -> StoreResult<()> {
        self.write_atomic(&self.snapshot_path(name), state)
    }

    fn load_named(&self, name: &SnapshotName) -> StoreResult<Option<PersistedState>> {
        self.read(&self.snapshot_path(name))
    }

    fn list_snapshots(&self) -> StoreResult<Vec<SnapshotInfo>> {
        let dir = self.dir.join(SNAPSHOT_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut infos = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| SnapshotName::new(stem).ok())
            else {
                continue;
            };

            match self.read(&path) {
                Ok(Some(state)) => infos.push(snapshot_info(&name, &state)),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
            }
        }

        sort_newest_first(&mut infos);
        Ok(infos)
    }
}
