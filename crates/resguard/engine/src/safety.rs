//! Banker's-Algorithm safety check.

use crate::account::ProcessAccount;
use resguard_types::{ProcessId, ResourceVector};
use serde::{Deserialize, Serialize};

/// Outcome of one safety simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub safe: bool,
    /// Completion order found by the simulation. Complete only when `safe`.
    pub sequence: Vec<ProcessId>,
    /// Processes that could not finish. Empty when `safe`.
    pub unfinished: Vec<ProcessId>,
}

/// Simulates completion of every account starting from `available`.
///
/// Repeatedly picks the first unfinished account (in slice order) whose need
/// fits in the working pool, returns its allocation to the pool and restarts
/// the scan. The state is safe iff every account finishes. O(n² · m).
pub fn evaluate(available: &ResourceVector, accounts: &[ProcessAccount]) -> SafetyReport {
    let mut work = *available;
    let mut finished = vec![false; accounts.len()];
    let mut sequence = Vec::with_capacity(accounts.len());

    loop {
        let candidate = accounts
            .iter()
            .enumerate()
            .find(|(i, account)| !finished[*i] && account.need().fits_within(&work));
        let Some((index, account)) = candidate else {
            break;
        };
        // Allocations come out of the same pool, so the sum stays within total.
        work = work.saturating_add(&account.allocation);
        finished[index] = true;
        sequence.push(account.pid.clone());
    }

    let unfinished: Vec<ProcessId> = accounts
        .iter()
        .zip(&finished)
        .filter(|(_, done)| !**done)
        .map(|(account, _)| account.pid.clone())
        .collect();

    SafetyReport {
        safe: unfinished.is_empty(),
        sequence,
        unfinished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, max: [u64; 4], alloc: [u64; 4]) -> ProcessAccount {
        ProcessAccount {
            pid: ProcessId::new(id).unwrap(),
            max_claim: ResourceVector::new(max),
            allocation: ResourceVector::new(alloc),
        }
    }

    fn ids(pids: &[ProcessId]) -> Vec<&str> {
        pids.iter().map(ProcessId::as_str).collect()
    }

    #[test]
    fn empty_system_is_safe() {
        let report = evaluate(&ResourceVector::zero(), &[]);
        assert!(report.safe);
        assert!(report.sequence.is_empty());
    }

    #[test]
    fn finds_first_fit_sequence() {
        // Classic five-process example, restricted to three kinds.
        let accounts = [
            account("p0", [7, 5, 3, 0], [0, 1, 0, 0]),
            account("p1", [3, 2, 2, 0], [2, 0, 0, 0]),
            account("p2", [9, 0, 2, 0], [3, 0, 2, 0]),
            account("p3", [2, 2, 2, 0], [2, 1, 1, 0]),
            account("p4", [4, 3, 3, 0], [0, 0, 2, 0]),
        ];
        let report = evaluate(&ResourceVector::new([3, 3, 2, 0]), &accounts);
        assert!(report.safe);
        assert_eq!(ids(&report.sequence), ["p1", "p3", "p0", "p2", "p4"]);
        assert!(report.unfinished.is_empty());
    }

    #[test]
    fn reports_stuck_processes() {
        let accounts = [
            account("a", [4, 0, 0, 0], [2, 0, 0, 0]),
            account("b", [4, 0, 0, 0], [1, 0, 0, 0]),
            account("c", [1, 0, 0, 0], [0, 0, 0, 0]),
        ];
        let report = evaluate(&ResourceVector::new([1, 0, 0, 0]), &accounts);
        assert!(!report.safe);
        assert_eq!(ids(&report.sequence), ["c"]);
        assert_eq!(ids(&report.unfinished), ["a", "b"]);
    }
}
