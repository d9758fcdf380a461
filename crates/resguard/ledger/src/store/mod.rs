//! Snapshot persistence.
//!
//! [`StateStore`] is the seam between the ledger and its storage. Two backends
//! ship with the crate: [`InMemoryStateStore`] and the JSON
//! [`FileStateStore`].

mod error;
mod file;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileStateStore;
pub use memory::InMemoryStateStore;
pub use traits::{SnapshotInfo, StateStore};
