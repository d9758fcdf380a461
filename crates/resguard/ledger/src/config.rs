//! Ledger configuration.

use crate::error::{LedgerError, LedgerResult};
use resguard_types::{ResourceKind, ResourceVector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-kind totals: cpu, memory, disk, network.
pub const DEFAULT_CAPACITY: [u64; ResourceKind::COUNT] = [100, 1000, 1000, 100];

/// Configuration for a [`crate::ResourceLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Total capacity per resource kind
    #[serde(default = "default_capacity")]
    pub capacity: ResourceVector,

    /// History entries kept before the oldest is evicted
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,

    /// Seconds between autosaves
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_history_size: default_max_history_size(),
            autosave_interval_secs: default_autosave_interval_secs(),
        }
    }
}

impl LedgerConfig {
    pub fn with_capacity(capacity: ResourceVector) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.max_history_size == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_history_size must be at least 1".to_string(),
            ));
        }
        if self.autosave_interval_secs == 0 {
            return Err(LedgerError::InvalidConfig(
                "autosave_interval_secs must be at least 1".to_string(),
            ));
        }
        if let Some((kind, _)) = self.capacity.iter().find(|(_, amount)| *amount == 0) {
            return Err(LedgerError::InvalidConfig(format!(
                "capacity for {kind} must be positive"
            )));
        }
        Ok(())
    }
}

fn default_capacity() -> ResourceVector {
    ResourceVector::new(DEFAULT_CAPACITY)
}

fn default_max_history_size() -> usize {
    1000
}

fn default_autosave_interval_secs() -> u64 {
    60
}
