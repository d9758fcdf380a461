//! The allocation engine: claims, allocations and the available pool.

use crate::account::ProcessAccount;
use crate::error::{EngineError, EngineResult};
use crate::safety::{self, SafetyReport};
use resguard_types::{ProcessId, ResourceKind, ResourceVector};
use tracing::{debug, trace};

/// Banker's-Algorithm engine.
///
/// Pure state machine: no I/O and no locking. Callers that share an engine
/// across threads must serialize access themselves.
///
/// Invariants held after every public call:
/// - `available + Σ allocation == total`
/// - `allocation <= max_claim <= total` for every process
/// - the safety check reports the state safe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankerSafetyEngine {
    total: ResourceVector,
    available: ResourceVector,
    /// Registration order; the safety scan follows it.
    processes: Vec<ProcessAccount>,
}

impl BankerSafetyEngine {
    /// Creates an engine with no processes and every unit available.
    pub fn new(total: ResourceVector) -> Self {
        Self {
            total,
            available: total,
            processes: Vec::new(),
        }
    }

    /// Rebuilds an engine from previously captured accounts.
    ///
    /// `available` is derived from `total` and the allocations. Fails with
    /// [`EngineError::Inconsistent`] on duplicate ids, claims above capacity,
    /// allocations above claims, over-allocation, or an unsafe state.
    pub fn restore(total: ResourceVector, accounts: Vec<ProcessAccount>) -> EngineResult<Self> {
        for (position, account) in accounts.iter().enumerate() {
            if accounts[..position].iter().any(|a| a.pid == account.pid) {
                return Err(EngineError::Inconsistent(format!(
                    "process '{}' appears twice",
                    account.pid
                )));
            }
            if let Some((kind, claim, cap)) = account.max_claim.first_excess(&total) {
                return Err(EngineError::Inconsistent(format!(
                    "'{}' claims {claim} {kind} but total is {cap}",
                    account.pid
                )));
            }
            if let Some((kind, held, claim)) = account.allocation.first_excess(&account.max_claim)
            {
                return Err(EngineError::Inconsistent(format!(
                    "'{}' holds {held} {kind} above its claim of {claim}",
                    account.pid
                )));
            }
        }

        let allocated = ResourceVector::checked_sum(accounts.iter().map(|a| &a.allocation))
            .ok_or_else(|| EngineError::Inconsistent("allocation overflow".to_string()))?;
        let available = total.checked_sub(&allocated).ok_or_else(|| {
            EngineError::Inconsistent(format!(
                "allocated {allocated} exceeds total capacity {total}"
            ))
        })?;

        let engine = Self {
            total,
            available,
            processes: accounts,
        };
        let report = engine.check_safety();
        if !report.safe {
            return Err(EngineError::Inconsistent(format!(
                "restored state is unsafe ({} processes cannot finish)",
                report.unfinished.len()
            )));
        }
        Ok(engine)
    }

    /// Registers `pid` with a fixed maximum claim and zero allocation.
    pub fn register(&mut self, pid: ProcessId, max_claim: ResourceVector) -> EngineResult<()> {
        if self.contains(&pid) {
            return Err(EngineError::DuplicateProcess(pid));
        }
        if let Some((kind, claim, total)) = max_claim.first_excess(&self.total) {
            return Err(EngineError::ClaimExceedsCapacity {
                process: pid,
                kind,
                claim,
                total,
            });
        }

        trace!(process = %pid, %max_claim, "registered");
        self.processes.push(ProcessAccount::new(pid, max_claim));
        Ok(())
    }

    /// Grants `delta` to `pid` if the resulting state is safe.
    ///
    /// Checks run in order: unknown process, remaining need, available pool,
    /// then the safety simulation on the tentative grant. An unsafe grant is
    /// rolled back before returning.
    pub fn request(&mut self, pid: &ProcessId, delta: &ResourceVector) -> EngineResult<()> {
        let index = self.index_of(pid)?;
        let need = self.processes[index].need();

        if let Some((kind, requested, need)) = delta.first_excess(&need) {
            return Err(EngineError::ExceedsNeed {
                process: pid.clone(),
                kind,
                requested,
                need,
            });
        }
        if let Some((kind, requested, available)) = delta.first_excess(&self.available) {
            return Err(EngineError::InsufficientResources {
                process: pid.clone(),
                kind,
                requested,
                available,
            });
        }

        let saved_available = self.available;
        let saved_allocation = self.processes[index].allocation;
        // Both bounds were checked above: delta <= available and delta <= need.
        self.available = self.available.saturating_sub(delta);
        self.processes[index].allocation = saved_allocation.saturating_add(delta);

        let report = self.check_safety();
        if !report.safe {
            self.available = saved_available;
            self.processes[index].allocation = saved_allocation;
            debug!(
                process = %pid,
                %delta,
                unfinished = report.unfinished.len(),
                "request rolled back: unsafe state"
            );
            return Err(EngineError::UnsafeState {
                process: pid.clone(),
                unfinished: report.unfinished,
            });
        }

        trace!(process = %pid, %delta, available = %self.available, "request granted");
        Ok(())
    }

    /// Returns `delta` from `pid`'s allocation to the pool.
    pub fn release(&mut self, pid: &ProcessId, delta: &ResourceVector) -> EngineResult<()> {
        let index = self.index_of(pid)?;
        let account = &mut self.processes[index];

        if let Some((kind, requested, held)) = delta.first_excess(&account.allocation) {
            return Err(EngineError::ExceedsAllocation {
                process: pid.clone(),
                kind,
                requested,
                held,
            });
        }

        account.allocation = account.allocation.saturating_sub(delta);
        self.available = self.available.saturating_add(delta);
        trace!(process = %pid, %delta, available = %self.available, "released");
        Ok(())
    }

    /// Deletes `pid`, returning its whole allocation to the pool.
    pub fn remove(&mut self, pid: &ProcessId) -> EngineResult<ProcessAccount> {
        let index = self.index_of(pid)?;
        let account = self.processes.remove(index);
        self.available = self.available.saturating_add(&account.allocation);
        trace!(process = %pid, returned = %account.allocation, "removed");
        Ok(account)
    }

    /// Changes the total capacity of one kind.
    ///
    /// The new total must cover everything currently allocated and every
    /// registered claim, and the resulting state must be safe. Rejected changes
    /// leave the engine untouched.
    pub fn set_capacity(&mut self, kind: ResourceKind, new_total: u64) -> EngineResult<()> {
        let allocated = self.allocated().get(kind);
        if new_total < allocated {
            return Err(EngineError::CapacityBelowAllocated {
                kind,
                requested: new_total,
                allocated,
            });
        }
        if let Some(account) = self
            .processes
            .iter()
            .find(|a| a.max_claim.get(kind) > new_total)
        {
            return Err(EngineError::CapacityBelowClaim {
                kind,
                requested: new_total,
                claim: account.max_claim.get(kind),
                process: account.pid.clone(),
            });
        }

        let (saved_total, saved_available) = (self.total, self.available);
        self.total.set(kind, new_total);
        self.available.set(kind, new_total - allocated);

        let report = self.check_safety();
        if !report.safe {
            self.total = saved_total;
            self.available = saved_available;
            return Err(EngineError::UnsafeCapacity {
                kind,
                requested: new_total,
                unfinished: report.unfinished,
            });
        }

        debug!(%kind, from = saved_total.get(kind), to = new_total, "capacity changed");
        Ok(())
    }

    /// Runs the safety simulation on the current state.
    pub fn check_safety(&self) -> SafetyReport {
        safety::evaluate(&self.available, &self.processes)
    }

    /// Drops every process and makes the whole capacity available again.
    pub fn clear(&mut self) -> usize {
        let dropped = self.processes.len();
        self.processes.clear();
        self.available = self.total;
        dropped
    }

    /// Sum of all current allocations.
    pub fn allocated(&self) -> ResourceVector {
        self.total.saturating_sub(&self.available)
    }

    /// Recomputes every invariant from scratch.
    pub fn check_invariants(&self) -> EngineResult<()> {
        let allocated = ResourceVector::checked_sum(self.processes.iter().map(|a| &a.allocation))
            .ok_or_else(|| EngineError::Inconsistent("allocation overflow".to_string()))?;
        if allocated.checked_add(&self.available) != Some(self.total) {
            return Err(EngineError::Inconsistent(format!(
                "available {} + allocated {allocated} != total {}",
                self.available, self.total
            )));
        }
        for account in &self.processes {
            if !account.allocation.fits_within(&account.max_claim)
                || !account.max_claim.fits_within(&self.total)
            {
                return Err(EngineError::Inconsistent(format!(
                    "'{}' violates allocation <= claim <= total",
                    account.pid
                )));
            }
        }
        if !self.check_safety().safe {
            return Err(EngineError::Inconsistent("state is unsafe".to_string()));
        }
        Ok(())
    }

    pub fn total(&self) -> ResourceVector {
        self.total
    }

    pub fn available(&self) -> ResourceVector {
        self.available
    }

    /// Accounts in registration order.
    pub fn accounts(&self) -> &[ProcessAccount] {
        &self.processes
    }

    pub fn account(&self, pid: &ProcessId) -> Option<&ProcessAccount> {
        self.processes.iter().find(|a| &a.pid == pid)
    }

    pub fn contains(&self, pid: &ProcessId) -> bool {
        self.account(pid).is_some()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    fn index_of(&self, pid: &ProcessId) -> EngineResult<usize> {
        self.processes
            .iter()
            .position(|a| &a.pid == pid)
            .ok_or_else(|| EngineError::UnknownProcess(pid.clone()))
    }
}
