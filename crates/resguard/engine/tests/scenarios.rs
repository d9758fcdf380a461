//! End-to-end allocation scenarios against the bare engine.

use resguard_engine::{BankerSafetyEngine, EngineError, ProcessAccount};
use resguard_types::{ErrorCategory, ProcessId, ResourceKind, ResourceVector};

fn pid(id: &str) -> ProcessId {
    ProcessId::new(id).unwrap()
}

fn v(amounts: [u64; 4]) -> ResourceVector {
    ResourceVector::new(amounts)
}

fn allocation(engine: &BankerSafetyEngine, id: &str) -> ResourceVector {
    engine.account(&pid(id)).unwrap().allocation
}

#[test]
fn request_then_release_updates_pool() {
    let mut engine = BankerSafetyEngine::new(ResourceVector::uniform(10));
    engine.register(pid("p1"), v([5, 5, 5, 5])).unwrap();

    engine.request(&pid("p1"), &v([3, 3, 3, 3])).unwrap();
    assert_eq!(allocation(&engine, "p1"), v([3, 3, 3, 3]));
    assert_eq!(engine.available(), v([7, 7, 7, 7]));

    engine.release(&pid("p1"), &v([2, 2, 2, 2])).unwrap();
    assert_eq!(allocation(&engine, "p1"), v([1, 1, 1, 1]));
    assert_eq!(engine.available(), v([9, 9, 9, 9]));
    engine.check_invariants().unwrap();
}

#[test]
fn oversized_request_is_denied_and_pool_stays_usable() {
    // Seven units per kind: after the first two grants only 4 cpu remain.
    let mut engine = BankerSafetyEngine::new(ResourceVector::uniform(7));
    engine.register(pid("p1"), v([7, 5, 3, 5])).unwrap();
    engine.register(pid("p2"), v([3, 2, 2, 3])).unwrap();

    engine.request(&pid("p1"), &v([2, 1, 1, 1])).unwrap();
    engine.request(&pid("p2"), &v([1, 1, 1, 1])).unwrap();

    let err = engine.request(&pid("p1"), &v([5, 4, 2, 4])).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientResources {
            process: pid("p1"),
            kind: ResourceKind::Cpu,
            requested: 5,
            available: 4,
        }
    );
    assert_eq!(allocation(&engine, "p1"), v([2, 1, 1, 1]));

    engine.request(&pid("p2"), &v([1, 1, 1, 1])).unwrap();
    assert_eq!(allocation(&engine, "p2"), v([2, 2, 2, 2]));
    engine.check_invariants().unwrap();
}

#[test]
fn request_up_to_full_claim_is_safe_when_pool_allows() {
    // With ten units per kind p1 can reach its full claim and finish, so the
    // same request is granted.
    let mut engine = BankerSafetyEngine::new(ResourceVector::uniform(10));
    engine.register(pid("p1"), v([7, 5, 3, 5])).unwrap();
    engine.register(pid("p2"), v([3, 2, 2, 3])).unwrap();
    engine.request(&pid("p1"), &v([2, 1, 1, 1])).unwrap();
    engine.request(&pid("p2"), &v([1, 1, 1, 1])).unwrap();

    engine.request(&pid("p1"), &v([5, 4, 2, 4])).unwrap();
    assert_eq!(allocation(&engine, "p1"), v([7, 5, 3, 5]));
    assert_eq!(engine.available(), v([2, 4, 6, 4]));

    let report = engine.check_safety();
    assert!(report.safe);
    assert_eq!(report.sequence, vec![pid("p1"), pid("p2")]);
}

#[test]
fn classic_unsafe_request_is_rolled_back() {
    let account = |id: &str, max: [u64; 4], alloc: [u64; 4]| ProcessAccount {
        pid: pid(id),
        max_claim: v(max),
        allocation: v(alloc),
    };
    let mut engine = BankerSafetyEngine::restore(
        v([10, 5, 7, 0]),
        vec![
            account("p0", [7, 5, 3, 0], [0, 1, 0, 0]),
            account("p1", [3, 2, 2, 0], [2, 0, 0, 0]),
            account("p2", [9, 0, 2, 0], [3, 0, 2, 0]),
            account("p3", [2, 2, 2, 0], [2, 1, 1, 0]),
            account("p4", [4, 3, 3, 0], [0, 0, 2, 0]),
        ],
    )
    .unwrap();
    assert_eq!(engine.available(), v([3, 3, 2, 0]));

    engine.request(&pid("p1"), &v([1, 0, 2, 0])).unwrap();
    assert_eq!(engine.available(), v([2, 3, 0, 0]));

    let err = engine.request(&pid("p4"), &v([3, 3, 0, 0])).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientResources { .. }));
    assert_eq!(err.category(), ErrorCategory::Validation);

    let before = engine.clone();
    let err = engine.request(&pid("p0"), &v([0, 2, 0, 0])).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Safety);
    match err {
        EngineError::UnsafeState { process, unfinished } => {
            assert_eq!(process, pid("p0"));
            assert_eq!(unfinished.len(), 5);
        }
        other => panic!("expected unsafe state, got {other:?}"),
    }
    assert_eq!(engine, before);
}

#[test]
fn remove_returns_allocation_to_pool() {
    let mut engine = BankerSafetyEngine::new(ResourceVector::uniform(10));
    engine.register(pid("p1"), v([5, 5, 5, 5])).unwrap();
    engine.request(&pid("p1"), &v([3, 3, 3, 3])).unwrap();

    let removed = engine.remove(&pid("p1")).unwrap();
    assert_eq!(removed.allocation, v([3, 3, 3, 3]));
    assert_eq!(engine.available(), v([10, 10, 10, 10]));
    assert!(engine.account(&pid("p1")).is_none());
    assert!(engine.is_empty());
}

#[test]
fn unknown_process_is_rejected_everywhere() {
    let mut engine = BankerSafetyEngine::new(ResourceVector::uniform(10));
    let ghost = pid("ghost");
    let unknown = EngineError::UnknownProcess(ghost.clone());

    assert_eq!(engine.request(&ghost, &v([1, 0, 0, 0])), Err(unknown.clone()));
    assert_eq!(engine.release(&ghost, &v([1, 0, 0, 0])), Err(unknown.clone()));
    assert_eq!(engine.remove(&ghost), Err(unknown));
    assert_eq!(engine.available(), ResourceVector::uniform(10));
}
