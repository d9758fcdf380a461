//! The thread-safe resource ledger.
//!
//! One [`parking_lot::Mutex`] guards the whole ledger: the engine, process
//! records, history and save bookkeeping. Every public operation takes it once
//! and releases it on every exit path, so operations are linearizable. Store
//! calls happen under the same lock.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::history::HistoryLog;
use crate::store::{InMemoryStateStore, SnapshotInfo, StateStore, StoreError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use resguard_engine::{BankerSafetyEngine, ProcessAccount, SafetyReport};
use resguard_types::{
    ErrorCategory, HistoryEntry, OperationKind, PersistedState, ProcessId, ProcessInfo,
    ProcessStatus, ResourceKind, ResourceVector, SnapshotName, SystemState,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// How a loaded snapshot is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestoreMode {
    /// Restore claims, allocations and statuses as saved.
    #[default]
    Exact,
    /// Restore claims only; every process comes back registered with nothing allocated.
    ClaimsOnly,
}

/// What [`ResourceLedger::remove_process`] hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedProcess {
    pub pid: ProcessId,
    /// Allocation returned to the pool.
    pub released: ResourceVector,
    /// Final record, with status [`ProcessStatus::Removed`].
    pub info: ProcessInfo,
}

struct LedgerInner {
    engine: BankerSafetyEngine,
    process_info: BTreeMap<ProcessId, ProcessInfo>,
    history: HistoryLog,
    last_saved: Option<DateTime<Utc>>,
}

/// Banker's-Algorithm resource ledger.
pub struct ResourceLedger {
    config: LedgerConfig,
    store: Arc<dyn StateStore>,
    inner: Mutex<LedgerInner>,
}

impl ResourceLedger {
    /// Creates an empty ledger with the configured capacity.
    pub fn new(config: LedgerConfig, store: Arc<dyn StateStore>) -> LedgerResult<Self> {
        config.validate()?;
        let inner = LedgerInner {
            engine: BankerSafetyEngine::new(config.capacity),
            process_info: BTreeMap::new(),
            history: HistoryLog::new(config.max_history_size),
            last_saved: None,
        };
        info!(capacity = %config.capacity, "resource ledger created");
        Ok(Self {
            config,
            store,
            inner: Mutex::new(inner),
        })
    }

    /// Ledger backed by an [`InMemoryStateStore`].
    pub fn in_memory(config: LedgerConfig) -> LedgerResult<Self> {
        Self::new(config, Arc::new(InMemoryStateStore::new()))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Registers a process with a fixed maximum claim.
    pub fn register_process(&self, pid: &str, max_claim: ResourceVector) -> LedgerResult<()> {
        self.register_process_with_metadata(pid, max_claim, BTreeMap::new())
    }

    /// Registers a process and attaches free-form metadata to its record.
    #[instrument(skip(self, max_claim, metadata), fields(max_claim = %max_claim))]
    pub fn register_process_with_metadata(
        &self,
        pid: &str,
        max_claim: ResourceVector,
        metadata: BTreeMap<String, String>,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.lock();
        let result = inner.register(pid, max_claim, metadata);
        inner.record(OperationKind::Register, pid, Some(max_claim), &result);
        log_outcome(OperationKind::Register, pid, &result);
        result
    }

    /// Grants `delta` to `pid` if the resulting state is safe.
    ///
    /// The first grant that leaves the process holding something moves it to
    /// [`ProcessStatus::Running`]. Denials leave status and allocations as they were.
    #[instrument(skip(self, delta), fields(delta = %delta))]
    pub fn request_resources(&self, pid: &str, delta: ResourceVector) -> LedgerResult<()> {
        let mut inner = self.inner.lock();
        let result = inner.request(pid, &delta);
        inner.record(OperationKind::Request, pid, Some(delta), &result);
        log_outcome(OperationKind::Request, pid, &result);
        result
    }

    /// Returns `delta` from `pid`'s allocation to the pool.
    #[instrument(skip(self, delta), fields(delta = %delta))]
    pub fn release_resources(&self, pid: &str, delta: ResourceVector) -> LedgerResult<()> {
        let mut inner = self.inner.lock();
        let result = inner.release(pid, &delta);
        inner.record(OperationKind::Release, pid, Some(delta), &result);
        log_outcome(OperationKind::Release, pid, &result);
        result
    }

    /// Deletes `pid`, returning its allocation to the pool.
    #[instrument(skip(self))]
    pub fn remove_process(&self, pid: &str) -> LedgerResult<RemovedProcess> {
        let mut inner = self.inner.lock();
        let result = inner.remove(pid);
        inner.record(OperationKind::Remove, pid, None, &result);
        log_outcome(OperationKind::Remove, pid, &result);
        result
    }

    /// Drops every process and the history; the whole capacity becomes available.
    ///
    /// Returns the number of processes dropped.
    #[instrument(skip(self))]
    pub fn reset_resources(&self) -> usize {
        let mut inner = self.inner.lock();
        let dropped = inner.engine.clear();
        inner.process_info.clear();
        inner.history.clear();
        info!(dropped, total = %inner.engine.total(), "ledger reset");
        dropped
    }

    /// Changes the total capacity of one resource kind.
    #[instrument(skip(self))]
    pub fn set_capacity(&self, kind: ResourceKind, new_total: u64) -> LedgerResult<()> {
        let mut inner = self.inner.lock();
        match inner.engine.set_capacity(kind, new_total) {
            Ok(()) => {
                info!(%kind, new_total, available = %inner.engine.available(), "capacity changed");
                Ok(())
            }
            Err(err) => {
                warn!(%kind, new_total, error = %err, "capacity change rejected");
                Err(err.into())
            }
        }
    }

    /// Deep copy of the current state.
    pub fn get_system_state(&self) -> SystemState {
        self.inner.lock().snapshot()
    }

    /// Safety simulation on the current state.
    pub fn check_safety(&self) -> SafetyReport {
        self.inner.lock().engine.check_safety()
    }

    /// Record for `pid`, if registered.
    pub fn process_info(&self, pid: &str) -> Option<ProcessInfo> {
        let pid = ProcessId::new(pid).ok()?;
        self.inner.lock().process_info.get(&pid).cloned()
    }

    /// History, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.lock().history.to_vec()
    }

    /// Timestamp of the last successful save, if any.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_saved
    }

    /// Persists the current state, as a named snapshot when `name` is given.
    ///
    /// Returns the save timestamp.
    #[instrument(skip(self))]
    pub fn save_state(&self, name: Option<&SnapshotName>) -> LedgerResult<DateTime<Utc>> {
        let mut inner = self.inner.lock();
        let persisted = PersistedState::capture(inner.snapshot(), name.cloned());

        let written = match name {
            Some(name) => self.store.save_named(name, &persisted),
            None => self.store.save(&persisted),
        };
        written.inspect_err(|err| warn!(error = %err, "failed to save state"))?;

        inner.last_saved = Some(persisted.saved_at);
        info!(
            processes = persisted.state.process_count(),
            saved_at = %persisted.saved_at,
            "state saved"
        );
        Ok(persisted.saved_at)
    }

    /// Restores the current state, or a named snapshot, exactly as saved.
    pub fn load_state(&self, name: Option<&SnapshotName>) -> LedgerResult<()> {
        self.load_state_with(name, RestoreMode::Exact)
    }

    /// Restores a saved state using `mode`.
    ///
    /// The snapshot is fully validated before anything is replaced; on any
    /// error the in-memory ledger is left untouched.
    #[instrument(skip(self))]
    pub fn load_state_with(
        &self,
        name: Option<&SnapshotName>,
        mode: RestoreMode,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.lock();

        let loaded = match name {
            Some(name) => self.store.load_named(name),
            None => self.store.load(),
        };
        let persisted = match loaded {
            Ok(Some(persisted)) => persisted,
            Ok(None) => {
                return Err(match name {
                    Some(name) => LedgerError::SnapshotNotFound(name.clone()),
                    None => LedgerError::NoSavedState,
                })
            }
            Err(StoreError::Serialization(reason)) => {
                warn!(%reason, "stored state is not valid JSON");
                return Err(LedgerError::MalformedSnapshot(reason));
            }
            Err(err) => return Err(err.into()),
        };

        let restored = LedgerInner::restore(persisted, mode, self.config.max_history_size)
            .inspect_err(|err| warn!(error = %err, "rejected stored state"))?;

        let processes = restored.engine.len();
        let last_saved = inner.last_saved;
        *inner = LedgerInner {
            last_saved,
            ..restored
        };
        info!(processes, ?mode, "state loaded");
        Ok(())
    }

    /// Named snapshots, newest first.
    pub fn list_snapshots(&self) -> LedgerResult<Vec<SnapshotInfo>> {
        Ok(self.store.list_snapshots()?)
    }
}

impl std::fmt::Debug for ResourceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerInner {
    fn register(
        &mut self,
        pid: &str,
        max_claim: ResourceVector,
        metadata: BTreeMap<String, String>,
    ) -> LedgerResult<()> {
        let pid = ProcessId::new(pid)?;
        self.engine.register(pid.clone(), max_claim)?;
        self.process_info
            .insert(pid, ProcessInfo::registered(metadata));
        Ok(())
    }

    fn request(&mut self, pid: &str, delta: &ResourceVector) -> LedgerResult<()> {
        let pid = ProcessId::new(pid)?;
        self.engine.request(&pid, delta)?;

        let holding = self
            .engine
            .account(&pid)
            .is_some_and(|account| !account.is_idle());
        if let Some(info) = self.process_info.get_mut(&pid) {
            if holding && info.status == ProcessStatus::Registered {
                info.status = ProcessStatus::Running;
            }
        }
        Ok(())
    }

    fn release(&mut self, pid: &str, delta: &ResourceVector) -> LedgerResult<()> {
        let pid = ProcessId::new(pid)?;
        self.engine.release(&pid, delta)?;
        Ok(())
    }

    fn remove(&mut self, pid: &str) -> LedgerResult<RemovedProcess> {
        let pid = ProcessId::new(pid)?;
        let account = self.engine.remove(&pid)?;
        let mut info = self
            .process_info
            .remove(&pid)
            .unwrap_or_else(|| ProcessInfo::registered(BTreeMap::new()));
        info.status = ProcessStatus::Removed;
        Ok(RemovedProcess {
            pid,
            released: account.allocation,
            info,
        })
    }

    fn record<T>(
        &mut self,
        kind: OperationKind,
        pid: &str,
        resources: Option<ResourceVector>,
        result: &LedgerResult<T>,
    ) {
        let entry = match result {
            Ok(_) => HistoryEntry::success(kind, pid, resources),
            Err(err) => HistoryEntry::failure(kind, pid, resources, err.to_string()),
        };
        self.history.push(entry);
    }

    fn snapshot(&self) -> SystemState {
        let accounts = self.engine.accounts();
        let mut state = SystemState::empty(self.engine.total());
        state.available = self.engine.available();
        for account in accounts {
            let pid = account.pid.clone();
            state.registration_order.push(pid.clone());
            state.max_claim.insert(pid.clone(), account.max_claim);
            state.allocation.insert(pid.clone(), account.allocation);
            state.need.insert(pid, account.need());
        }
        state.process_info = self.process_info.clone();
        state.history = self.history.to_vec();
        state
    }

    fn restore(
        persisted: PersistedState,
        mode: RestoreMode,
        max_history_size: usize,
    ) -> LedgerResult<Self> {
        persisted
            .validate()
            .map_err(|err| LedgerError::MalformedSnapshot(err.to_string()))?;

        let SystemState {
            total,
            registration_order,
            mut max_claim,
            mut allocation,
            mut process_info,
            history,
            ..
        } = persisted.state;

        let mut accounts = Vec::with_capacity(registration_order.len());
        let mut infos = BTreeMap::new();
        for pid in registration_order {
            // Key sets were checked by validate().
            let (Some(claim), Some(held), Some(mut info)) = (
                max_claim.remove(&pid),
                allocation.remove(&pid),
                process_info.remove(&pid),
            ) else {
                return Err(LedgerError::MalformedSnapshot(format!(
                    "missing records for '{pid}'"
                )));
            };

            let mut account = ProcessAccount::new(pid.clone(), claim);
            match mode {
                RestoreMode::Exact => account.allocation = held,
                RestoreMode::ClaimsOnly => info.status = ProcessStatus::Registered,
            }
            accounts.push(account);
            infos.insert(pid, info);
        }

        let engine = BankerSafetyEngine::restore(total, accounts)
            .map_err(|err| LedgerError::MalformedSnapshot(err.to_string()))?;

        Ok(Self {
            engine,
            process_info: infos,
            history: HistoryLog::from_entries(history, max_history_size),
            last_saved: None,
        })
    }
}

fn log_outcome<T>(kind: OperationKind, pid: &str, result: &LedgerResult<T>) {
    match result {
        Ok(_) => debug!(operation = %kind, process = pid, "granted"),
        Err(err) if err.category() == ErrorCategory::Safety => {
            warn!(operation = %kind, process = pid, reason = %err, "denied: unsafe state")
        }
        Err(err) => debug!(operation = %kind, process = pid, reason = %err, "denied"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(total: u64) -> ResourceLedger {
        ResourceLedger::in_memory(LedgerConfig::with_capacity(ResourceVector::uniform(total)))
            .unwrap()
    }

    #[test]
    fn status_moves_to_running_on_first_grant() {
        let ledger = ledger(10);
        ledger
            .register_process("p1", ResourceVector::uniform(5))
            .unwrap();
        assert_eq!(
            ledger.process_info("p1").unwrap().status,
            ProcessStatus::Registered
        );

        ledger
            .request_resources("p1", ResourceVector::zero())
            .unwrap();
        assert_eq!(
            ledger.process_info("p1").unwrap().status,
            ProcessStatus::Registered
        );

        ledger
            .request_resources("p1", ResourceVector::uniform(1))
            .unwrap();
        assert_eq!(
            ledger.process_info("p1").unwrap().status,
            ProcessStatus::Running
        );

        let removed = ledger.remove_process("p1").unwrap();
        assert_eq!(removed.info.status, ProcessStatus::Removed);
        assert_eq!(removed.released, ResourceVector::uniform(1));
        assert!(ledger.process_info("p1").is_none());
    }

    #[test]
    fn invalid_ids_are_rejected_and_recorded() {
        let ledger = ledger(10);
        let err = ledger
            .register_process("bad id", ResourceVector::uniform(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert_eq!(err.category(), ErrorCategory::Validation);

        let history = ledger.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].process_id, "bad id");
        assert!(!history[0].succeeded());
    }

    #[test]
    fn reset_clears_processes_and_history() {
        let ledger = ledger(10);
        ledger
            .register_process("p1", ResourceVector::uniform(5))
            .unwrap();
        ledger
            .request_resources("p1", ResourceVector::uniform(2))
            .unwrap();

        assert_eq!(ledger.reset_resources(), 1);
        let state = ledger.get_system_state();
        assert_eq!(state.available, ResourceVector::uniform(10));
        assert!(state.max_claim.is_empty());
        assert!(state.history.is_empty());
    }

    #[test]
    fn capacity_change_is_not_recorded_in_history() {
        let ledger = ledger(10);
        ledger.set_capacity(ResourceKind::Disk, 20).unwrap();
        assert!(ledger.history().is_empty());
        assert_eq!(ledger.get_system_state().total.get(ResourceKind::Disk), 20);
    }

    #[test]
    fn missing_current_state_reports_no_saved_state() {
        let ledger = ledger(10);
        assert!(matches!(
            ledger.load_state(None),
            Err(LedgerError::NoSavedState)
        ));
        let name = SnapshotName::new("absent").unwrap();
        assert!(matches!(
            ledger.load_state(Some(&name)),
            Err(LedgerError::SnapshotNotFound(_))
        ));
    }
}
