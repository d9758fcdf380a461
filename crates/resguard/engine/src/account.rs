use resguard_types::{ProcessId, ResourceVector};

/// Per-process bookkeeping held by the engine.
///
/// `need` is never stored; it is always `max_claim - allocation`, which the
/// engine keeps non-negative by refusing requests beyond the remaining need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessAccount {
    pub pid: ProcessId,
    pub max_claim: ResourceVector,
    pub allocation: ResourceVector,
}

impl ProcessAccount {
    pub fn new(pid: ProcessId, max_claim: ResourceVector) -> Self {
        Self {
            pid,
            max_claim,
            allocation: ResourceVector::zero(),
        }
    }

    pub fn need(&self) -> ResourceVector {
        self.max_claim.saturating_sub(&self.allocation)
    }

    pub fn is_idle(&self) -> bool {
        self.allocation.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn need_tracks_allocation() {
        let mut account =
            ProcessAccount::new(ProcessId::new("p1").unwrap(), ResourceVector::new([7, 5, 3, 5]));
        assert_eq!(account.need(), account.max_claim);
        assert!(account.is_idle());

        account.allocation = ResourceVector::new([2, 1, 1, 1]);
        assert_eq!(account.need(), ResourceVector::new([5, 4, 2, 4]));
        assert!(!account.is_idle());
    }
}
