//! ResGuard resource ledger.
//!
//! [`ResourceLedger`] wraps a [`resguard_engine::BankerSafetyEngine`] with:
//! - process lifecycle tracking (`registered -> running -> removed`)
//! - a bounded, append-only history of every attempted operation
//! - persistence through a pluggable [`StateStore`], including named snapshots
//! - thread-safe entry points behind a single lock
//!
//! [`AutosaveTask`] saves a shared ledger periodically on a tokio runtime.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod autosave;
mod config;
mod error;
mod history;
mod ledger;
pub mod store;

pub use autosave::AutosaveTask;
pub use config::{LedgerConfig, DEFAULT_CAPACITY};
pub use error::{LedgerError, LedgerResult};
pub use history::HistoryLog;
pub use ledger::{RemovedProcess, ResourceLedger, RestoreMode};
pub use store::{FileStateStore, InMemoryStateStore, SnapshotInfo, StateStore, StoreError};

pub use resguard_engine::{EngineError, SafetyReport};
