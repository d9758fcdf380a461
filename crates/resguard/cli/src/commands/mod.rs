//! Command implementations
//!
//! Every invocation rebuilds the ledger from the state directory, runs one
//! command and, for mutating commands, writes the state back.

pub mod admin;
pub mod process;
pub mod snapshot;

use crate::config::ResGuardConfig;
use crate::error::CliResult;
use resguard_ledger::{FileStateStore, LedgerError, ResourceLedger};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state for one CLI invocation
pub struct Context {
    pub config: ResGuardConfig,
    pub state_dir: PathBuf,
}

impl Context {
    pub fn new(config: ResGuardConfig, state_dir: Option<PathBuf>) -> Self {
        let state_dir = state_dir.unwrap_or_else(|| config.system.state_dir.clone());
        Self { config, state_dir }
    }

    /// Ledger over the state directory, restored from the last save if any
    pub fn open_ledger(&self) -> CliResult<ResourceLedger> {
        let store = Arc::new(FileStateStore::new(&self.state_dir));
        let ledger = ResourceLedger::new(self.config.ledger_config(), store)?;
        match ledger.load_state(None) {
            Ok(()) => {}
            Err(LedgerError::NoSavedState) => {
                tracing::debug!(dir = %self.state_dir.display(), "no saved state, starting fresh");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(ledger)
    }

    /// Runs `op` against the ledger and saves afterwards, even when `op` was
    /// denied, so the attempt stays in the persisted history.
    pub fn mutate<T>(
        &self,
        op: impl FnOnce(&ResourceLedger) -> Result<T, LedgerError>,
    ) -> CliResult<T> {
        let ledger = self.open_ledger()?;
        let result = op(&ledger);
        ledger.save_state(None)?;
        Ok(result?)
    }
}
