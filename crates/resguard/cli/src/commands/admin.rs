//! Ledger-wide commands: state, safety, history, capacity, reset

use super::Context;
use crate::error::CliResult;
use crate::output::{self, compact, print_info, print_success, print_warning};
use clap::Subcommand;
use resguard_types::{Outcome, ResourceKind};
use tabled::Tabled;

/// Ledger-wide subcommands
#[derive(Debug, Subcommand)]
pub enum AdminCommands {
    /// Show the pool and every registered process
    State {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the safety check on the current state
    Safety,

    /// Show the operation history, oldest first
    History {
        /// Only the last N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Change the total capacity of one resource kind
    Capacity {
        /// Resource kind (cpu, memory, disk, network)
        kind: ResourceKind,

        /// New total
        total: u64,
    },

    /// Drop every process and make the whole capacity available
    Reset,
}

#[derive(Debug, Tabled)]
struct HistoryRow {
    time: String,
    operation: String,
    process: String,
    resources: String,
    result: String,
}

/// Execute a ledger-wide command
pub fn execute(command: AdminCommands, ctx: &Context) -> CliResult<()> {
    match command {
        AdminCommands::State { json } => {
            let state = ctx.open_ledger()?.get_system_state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                output::print_table(output::pool_rows(&state), "No resources");
                output::print_table(output::process_rows(&state), "No processes registered");
            }
        }
        AdminCommands::Safety => {
            let report = ctx.open_ledger()?.check_safety();
            let names = |pids: &[resguard_types::ProcessId]| {
                pids.iter()
                    .map(|pid| pid.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            };
            if report.safe {
                print_success("System is in a safe state");
                if !report.sequence.is_empty() {
                    print_info(&format!("Safe sequence: {}", names(&report.sequence)));
                }
            } else {
                print_warning(&format!(
                    "System is UNSAFE; cannot finish: {}",
                    names(&report.unfinished)
                ));
            }
        }
        AdminCommands::History { limit } => {
            let history = ctx.open_ledger()?.history();
            let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
            let rows: Vec<HistoryRow> = history
                .into_iter()
                .skip(skip)
                .map(|entry| HistoryRow {
                    time: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    operation: entry.kind.to_string(),
                    process: entry.process_id,
                    resources: entry.resources.as_ref().map(compact).unwrap_or_default(),
                    result: match entry.outcome {
                        Outcome::Success => "success".to_string(),
                        Outcome::Failure { reason } => format!("failed: {reason}"),
                    },
                })
                .collect();
            output::print_table(rows, "No history");
        }
        AdminCommands::Capacity { kind, total } => {
            ctx.mutate(|ledger| ledger.set_capacity(kind, total))?;
            print_success(&format!("Capacity of {kind} set to {total}"));
        }
        AdminCommands::Reset => {
            let dropped = ctx.mutate(|ledger| Ok(ledger.reset_resources()))?;
            print_success(&format!("Reset ledger, dropped {dropped} process(es)"));
        }
    }
    Ok(())
}
