//! Process commands: register, request, release, remove

use super::Context;
use crate::error::CliResult;
use crate::output::{compact, print_success};
use clap::{Args, Subcommand};
use resguard_types::{ResourceKind, ResourceVector};
use std::collections::BTreeMap;

/// Resource amounts given on the command line; omitted kinds are zero
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct ResourceArgs {
    /// CPU units
    #[arg(long, default_value_t = 0)]
    pub cpu: u64,

    /// Memory units
    #[arg(long, alias = "mem", default_value_t = 0)]
    pub memory: u64,

    /// Disk units
    #[arg(long, default_value_t = 0)]
    pub disk: u64,

    /// Network units
    #[arg(long, alias = "net", default_value_t = 0)]
    pub network: u64,
}

impl ResourceArgs {
    pub fn vector(&self) -> ResourceVector {
        ResourceVector::zero()
            .with(ResourceKind::Cpu, self.cpu)
            .with(ResourceKind::Memory, self.memory)
            .with(ResourceKind::Disk, self.disk)
            .with(ResourceKind::Network, self.network)
    }
}

/// Process subcommands
#[derive(Debug, Subcommand)]
pub enum ProcessCommands {
    /// Register a process with its maximum claim
    Register {
        /// Process ID
        pid: String,

        #[command(flatten)]
        max_claim: ResourceArgs,

        /// Metadata entry (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
    },

    /// Request resources for a process
    Request {
        /// Process ID
        pid: String,

        #[command(flatten)]
        amounts: ResourceArgs,
    },

    /// Release resources held by a process
    Release {
        /// Process ID
        pid: String,

        #[command(flatten)]
        amounts: ResourceArgs,
    },

    /// Remove a process and return its allocation
    Remove {
        /// Process ID
        pid: String,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Execute a process command
pub fn execute(command: ProcessCommands, ctx: &Context) -> CliResult<()> {
    match command {
        ProcessCommands::Register {
            pid,
            max_claim,
            metadata,
        } => {
            let claim = max_claim.vector();
            let metadata: BTreeMap<String, String> = metadata.into_iter().collect();
            ctx.mutate(|ledger| ledger.register_process_with_metadata(&pid, claim, metadata))?;
            print_success(&format!("Registered {pid} with max claim {}", compact(&claim)));
        }
        ProcessCommands::Request { pid, amounts } => {
            let delta = amounts.vector();
            ctx.mutate(|ledger| ledger.request_resources(&pid, delta))?;
            print_success(&format!("Granted {} to {pid}", compact(&delta)));
        }
        ProcessCommands::Release { pid, amounts } => {
            let delta = amounts.vector();
            ctx.mutate(|ledger| ledger.release_resources(&pid, delta))?;
            print_success(&format!("Released {} from {pid}", compact(&delta)));
        }
        ProcessCommands::Remove { pid } => {
            let removed = ctx.mutate(|ledger| ledger.remove_process(&pid))?;
            print_success(&format!(
                "Removed {pid}, returned {}",
                compact(&removed.released)
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("owner=ops=team").unwrap(),
            ("owner".to_string(), "ops=team".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_omitted_kinds_are_zero() {
        let args = ResourceArgs {
            cpu: 2,
            disk: 5,
            ..ResourceArgs::default()
        };
        assert_eq!(args.vector(), ResourceVector::new([2, 0, 5, 0]));
    }
}
