//! Output formatting utilities

use colored::*;
use resguard_types::{status_label, ResourceKind, ResourceVector, SystemState};
use tabled::{Table, Tabled};

/// Per-process row of the state table
#[derive(Debug, Tabled)]
pub struct ProcessRow {
    process: String,
    status: String,
    max_claim: String,
    allocation: String,
    need: String,
}

/// Per-kind row of the pool table
#[derive(Debug, Tabled)]
pub struct PoolRow {
    kind: String,
    total: u64,
    allocated: u64,
    available: u64,
}

pub fn process_rows(state: &SystemState) -> Vec<ProcessRow> {
    let zero = ResourceVector::zero();
    state
        .registration_order
        .iter()
        .map(|pid| ProcessRow {
            process: pid.to_string(),
            status: status_label(state.process_info.get(pid)).to_string(),
            max_claim: compact(state.max_claim.get(pid).unwrap_or(&zero)),
            allocation: compact(state.allocation.get(pid).unwrap_or(&zero)),
            need: compact(state.need.get(pid).unwrap_or(&zero)),
        })
        .collect()
}

pub fn pool_rows(state: &SystemState) -> Vec<PoolRow> {
    ResourceKind::ALL
        .iter()
        .map(|kind| PoolRow {
            kind: kind.to_string(),
            total: state.total.get(*kind),
            allocated: state.total.get(*kind).saturating_sub(state.available.get(*kind)),
            available: state.available.get(*kind),
        })
        .collect()
}

/// `cpu/memory/disk/network` amounts separated by slashes
pub fn compact(vector: &ResourceVector) -> String {
    vector
        .iter()
        .map(|(_, amount)| amount.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Print a table, or a placeholder when there are no rows
pub fn print_table<T: Tabled>(rows: Vec<T>, empty: &str) {
    if rows.is_empty() {
        println!("{}", empty.dimmed());
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
