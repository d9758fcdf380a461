//! CLI configuration

use crate::error::{CliError, CliResult};
use resguard_ledger::{LedgerConfig, DEFAULT_CAPACITY};
use resguard_types::{ResourceKind, ResourceVector};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration file (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResGuardConfig {
    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub resources: ResourcesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[system]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Directory holding saved state and snapshots
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// History entries kept by the ledger
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,

    /// Seconds between autosaves for long-running embedders
    #[serde(default = "default_state_save_interval")]
    pub state_save_interval: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            max_history_size: default_max_history_size(),
            state_save_interval: default_state_save_interval(),
        }
    }
}

/// `[resources]` section: total capacity per kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default = "default_cpu")]
    pub cpu: u64,
    #[serde(default = "default_memory")]
    pub memory: u64,
    #[serde(default = "default_disk")]
    pub disk: u64,
    #[serde(default = "default_network")]
    pub network: u64,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            memory: default_memory(),
            disk: default_disk(),
            network: default_network(),
        }
    }
}

impl ResourcesConfig {
    pub fn capacity(&self) -> ResourceVector {
        ResourceVector::zero()
            .with(ResourceKind::Cpu, self.cpu)
            .with(ResourceKind::Memory, self.memory)
            .with(ResourceKind::Disk, self.disk)
            .with(ResourceKind::Network, self.network)
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ResGuardConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn from_file(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    /// `<config_dir>/resguard/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("resguard").join("config.toml"))
    }

    /// Ledger settings derived from this file
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            capacity: self.resources.capacity(),
            max_history_size: self.system.max_history_size,
            autosave_interval_secs: self.system.state_save_interval,
        }
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("states")
}

fn default_max_history_size() -> usize {
    1000
}

fn default_state_save_interval() -> u64 {
    60
}

fn default_cpu() -> u64 {
    DEFAULT_CAPACITY[ResourceKind::Cpu.index()]
}

fn default_memory() -> u64 {
    DEFAULT_CAPACITY[ResourceKind::Memory.index()]
}

fn default_disk() -> u64 {
    DEFAULT_CAPACITY[ResourceKind::Disk.index()]
}

fn default_network() -> u64 {
    DEFAULT_CAPACITY[ResourceKind::Network.index()]
}

fn default_log_level() -> String {
    "info".to_string()
}
