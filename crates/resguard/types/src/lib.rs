//! ResGuard shared types.
//!
//! Everything the engine, the ledger and external observers exchange lives here:
//! - [`ResourceKind`] and [`ResourceVector`]: the fixed set of allocatable kinds
//!   and per-kind amounts
//! - [`ProcessId`], [`ProcessStatus`], [`ProcessInfo`]: process identity and lifecycle
//! - [`HistoryEntry`]: one audited ledger operation
//! - [`SystemState`] / [`PersistedState`]: the observer snapshot and its
//!   versioned on-disk schema

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod history;
mod kind;
mod process;
mod state;
mod vector;

pub use error::{ErrorCategory, TypesError};
pub use history::{HistoryEntry, OperationKind, Outcome};
pub use kind::ResourceKind;
pub use process::{status_label, ProcessId, ProcessInfo, ProcessStatus};
pub use state::{PersistedState, SnapshotName, SystemState, SNAPSHOT_SCHEMA_VERSION};
pub use vector::ResourceVector;
