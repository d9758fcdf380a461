//! Named snapshot commands

use super::Context;
use crate::error::CliResult;
use crate::output::{self, print_success};
use clap::Subcommand;
use resguard_ledger::RestoreMode;
use resguard_types::SnapshotName;
use tabled::Tabled;

/// Snapshot subcommands
#[derive(Debug, Subcommand)]
pub enum SnapshotCommands {
    /// Save the current state under a name
    Create {
        /// Snapshot name (letters, digits, '_' and '-')
        name: SnapshotName,
    },

    /// List snapshots, newest first
    List,

    /// Restore a snapshot as the current state
    Restore {
        /// Snapshot name
        name: SnapshotName,

        /// Restore claims only; all allocations start at zero
        #[arg(long)]
        claims_only: bool,
    },
}

#[derive(Debug, Tabled)]
struct SnapshotRow {
    name: String,
    created: String,
}

/// Execute a snapshot command
pub fn execute(command: SnapshotCommands, ctx: &Context) -> CliResult<()> {
    match command {
        SnapshotCommands::Create { name } => {
            let ledger = ctx.open_ledger()?;
            let saved_at = ledger.save_state(Some(&name))?;
            print_success(&format!("Snapshot {name} saved at {}", saved_at.to_rfc3339()));
        }
        SnapshotCommands::List => {
            let rows: Vec<SnapshotRow> = ctx
                .open_ledger()?
                .list_snapshots()?
                .into_iter()
                .map(|info| SnapshotRow {
                    name: info.name.to_string(),
                    created: info.created_at.to_rfc3339(),
                })
                .collect();
            output::print_table(rows, "No snapshots");
        }
        SnapshotCommands::Restore { name, claims_only } => {
            let mode = if claims_only {
                RestoreMode::ClaimsOnly
            } else {
                RestoreMode::Exact
            };
            let ledger = ctx.open_ledger()?;
            ledger.load_state_with(Some(&name), mode)?;
            ledger.save_state(None)?;
            print_success(&format!("Restored snapshot {name}"));
        }
    }
    Ok(())
}
