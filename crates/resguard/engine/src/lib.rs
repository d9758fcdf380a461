//! ResGuard allocation engine.
//!
//! [`BankerSafetyEngine`] holds per-process maximum claims, current
//! allocations and the available pool, and only grants requests that leave
//! the system in a safe state (one where every process can still run to
//! completion in some order). The engine does no I/O and no locking; the
//! ledger crate wraps it with lifecycle tracking, history and persistence.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod account;
mod engine;
mod error;
mod safety;

pub use account::ProcessAccount;
pub use engine::BankerSafetyEngine;
pub use error::{EngineError, EngineResult};
pub use safety::{evaluate, SafetyReport};
