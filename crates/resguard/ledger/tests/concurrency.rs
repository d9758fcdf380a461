//! Concurrent access and the autosave task.

use proptest::prelude::*;
use resguard_ledger::{AutosaveTask, InMemoryStateStore, LedgerConfig, ResourceLedger, StateStore};
use resguard_types::{ResourceKind, ResourceVector};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn shared_ledger(total: u64) -> Arc<ResourceLedger> {
    Arc::new(
        ResourceLedger::in_memory(LedgerConfig::with_capacity(ResourceVector::uniform(total)))
            .unwrap(),
    )
}

#[test]
fn concurrent_requests_keep_the_pool_consistent() {
    let ledger = shared_ledger(20);
    for worker in 0..8 {
        ledger
            .register_process(&format!("w{worker}"), ResourceVector::uniform(6))
            .unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let pid = format!("w{worker}");
                for round in 0..50 {
                    let delta = ResourceVector::uniform(1 + (round % 3));
                    if ledger.request_resources(&pid, delta).is_ok() {
                        ledger.release_resources(&pid, delta).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let state = ledger.get_system_state();
    assert_eq!(state.available, ResourceVector::uniform(20));
    assert!(state.check_consistency().is_ok());
    assert!(ledger.check_safety().safe);
}

#[test]
fn snapshots_taken_during_writes_are_consistent() {
    let ledger = shared_ledger(10);
    ledger
        .register_process("p1", ResourceVector::uniform(10))
        .unwrap();

    let writer = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            for _ in 0..200 {
                ledger
                    .request_resources("p1", ResourceVector::uniform(3))
                    .unwrap();
                ledger
                    .release_resources("p1", ResourceVector::uniform(3))
                    .unwrap();
            }
        })
    };

    for _ in 0..200 {
        assert!(ledger.get_system_state().check_consistency().is_ok());
    }
    writer.join().unwrap();
}

#[tokio::test(start_paused = true)]
async fn autosave_saves_periodically_and_on_shutdown() {
    let store = Arc::new(InMemoryStateStore::new());
    let ledger = Arc::new(
        ResourceLedger::new(LedgerConfig::default(), store.clone() as Arc<dyn StateStore>)
            .unwrap(),
    );
    ledger
        .register_process("p1", ResourceVector::uniform(1))
        .unwrap();

    let task = AutosaveTask::spawn(Arc::clone(&ledger), Duration::from_secs(30));
    assert!(ledger.last_saved().is_none());

    tokio::time::sleep(Duration::from_secs(31)).await;
    // Let the blocking save finish.
    for _ in 0..50 {
        if ledger.last_saved().is_some() {
            break;
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let first = ledger.last_saved().expect("periodic save");
    assert!(store.load().unwrap().is_some());

    ledger
        .register_process("p2", ResourceVector::uniform(1))
        .unwrap();
    let final_save = task.shutdown().await.unwrap();
    assert!(final_save >= first);

    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.state.process_count(), 2);
}

#[tokio::test]
async fn autosave_uses_configured_interval() {
    let ledger = shared_ledger(5);
    let task = AutosaveTask::from_config(Arc::clone(&ledger));
    assert!(!task.is_finished());
    task.shutdown().await.unwrap();
    assert!(ledger.last_saved().is_some());
}

#[derive(Debug, Clone)]
enum Op {
    Register(u8, u64),
    Request(u8, u64),
    Release(u8, u64),
    Remove(u8),
    Capacity(u64),
}

fn op_strategy() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            (0u8..4, 0u64..8).prop_map(|(p, n)| Op::Register(p, n)),
            (0u8..4, 0u64..4).prop_map(|(p, n)| Op::Request(p, n)),
            (0u8..4, 0u64..4).prop_map(|(p, n)| Op::Release(p, n)),
            (0u8..4).prop_map(Op::Remove),
            (4u64..12).prop_map(Op::Capacity),
        ],
        0..30,
    )
}

proptest! {
    #[test]
    fn property_history_records_every_attempt(ops in op_strategy()) {
        let ledger = shared_ledger(6);
        let mut attempts = 0usize;

        for op in &ops {
            match op {
                Op::Register(p, n) => {
                    attempts += 1;
                    let _ = ledger.register_process(&format!("p{p}"), ResourceVector::uniform(*n));
                }
                Op::Request(p, n) => {
                    attempts += 1;
                    let _ = ledger.request_resources(&format!("p{p}"), ResourceVector::uniform(*n));
                }
                Op::Release(p, n) => {
                    attempts += 1;
                    let _ = ledger.release_resources(&format!("p{p}"), ResourceVector::uniform(*n));
                }
                Op::Remove(p) => {
                    attempts += 1;
                    let _ = ledger.remove_process(&format!("p{p}"));
                }
                Op::Capacity(n) => {
                    let _ = ledger.set_capacity(ResourceKind::Cpu, *n);
                }
            }

            let state = ledger.get_system_state();
            prop_assert!(state.check_consistency().is_ok());
            prop_assert!(ledger.check_safety().safe);
        }

        prop_assert_eq!(ledger.history().len(), attempts);
    }
}
