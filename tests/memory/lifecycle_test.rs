/*!
 * Lifecycle Tests
 * Release, release-finished and policy changes against a mocked host
 */

use super::common::{alloc, engine};
use memsim_kernel::memory::{
    MemoryError, ProcessLifecycle, ProcessRef, ProcessRegistry, Request, Response, ScalingPolicy,
};
use mockall::mock;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;

mock! {
    pub Host {}

    impl ProcessLifecycle for Host {
        fn is_finished(&self, pid: u32) -> bool;
        fn stop_all(&mut self);
    }
}

#[test]
fn test_release_twice_equals_once() {
    let mut engine = engine(8, ScalingPolicy::Lru);
    alloc(&mut engine, 1, 3);
    alloc(&mut engine, 2, 2);

    engine.release(1);
    let once = engine.snapshot();
    let second = engine.release(1);
    assert!(second.is_noop());
    assert_eq!(engine.snapshot(), once);
}

#[test]
fn test_allocate_then_release_restores_free_counts() {
    for policy in ScalingPolicy::ALL {
        let mut engine = engine(12, policy);
        alloc(&mut engine, 1, 4);
        let physical_free = engine.physical().free_count();
        let swap_free = engine.swap().free_count();

        alloc(&mut engine, 2, 5);
        engine.release(2);
        assert_eq!(engine.physical().free_count(), physical_free, "{}", policy);
        assert_eq!(engine.swap().free_count(), swap_free, "{}", policy);
    }
}

#[test]
fn test_release_covers_both_stores() {
    let mut engine = engine(2, ScalingPolicy::Fifo);
    alloc(&mut engine, 1, 2);
    alloc(&mut engine, 2, 1);
    let outcome = engine.release(1);
    assert_eq!((outcome.freed_physical, outcome.freed_swap), (0, 2));
    assert!(engine.process(1).is_none());
}

#[test]
fn test_release_finished_asks_the_host() {
    let mut engine = engine(10, ScalingPolicy::FirstFit);
    for pid in 1..=3 {
        alloc(&mut engine, pid, 2);
    }

    let mut host = MockHost::new();
    host.expect_is_finished().with(eq(1)).return_const(false);
    host.expect_is_finished().with(eq(2)).return_const(true);
    host.expect_is_finished().with(eq(3)).return_const(false);

    let outcome = engine.release_finished(3, &host);
    assert_eq!(outcome.released, vec![2, 3]);
    assert_eq!(engine.allocation_order().to_vec(), vec![1]);
}

#[test]
fn test_policy_change_stops_processes_first() {
    let mut engine = engine(10, ScalingPolicy::WorstFit);
    let mut host = MockHost::new();
    host.expect_stop_all().times(1).return_const(());

    let change = engine.set_policy(ScalingPolicy::Nru, &mut host);
    assert_eq!(change.previous, ScalingPolicy::WorstFit);
    assert_eq!(change.current, ScalingPolicy::Nru);
}

#[test]
fn test_failed_retry_stays_pending() {
    let mut engine = engine(4, ScalingPolicy::FirstFit);
    let mut registry = ProcessRegistry::new();
    assert!(engine.allocate(ProcessRef::new(1, 0), 9).is_err());

    let change = engine.set_policy(ScalingPolicy::Fifo, &mut registry);
    assert!(matches!(
        change.retried,
        Some(Err(MemoryError::InsufficientCapacity { .. }))
    ));
    assert_eq!(engine.pending().map(|p| p.process.id), Some(1));
}

#[test]
fn test_release_clears_pending() {
    let mut engine = engine(4, ScalingPolicy::FirstFit);
    assert!(engine.allocate(ProcessRef::new(1, 0), 9).is_err());
    engine.release(1);
    assert!(engine.pending().is_none());
}

#[test]
fn test_request_script_through_handle() {
    let mut engine = engine(10, ScalingPolicy::FirstFit);
    let mut registry = ProcessRegistry::new();
    let script: Vec<Request> = serde_json::from_str(
        r#"[
            {"op": "allocate", "pid": 1, "blocks": 4},
            {"op": "allocate", "pid": 2, "blocks": 4},
            {"op": "release_finished", "pid": 2},
            {"op": "stats"}
        ]"#,
    )
    .unwrap();

    let responses: Vec<Response> = script
        .into_iter()
        .map(|r| engine.handle(r, &mut registry).unwrap())
        .collect();

    match &responses[3] {
        Response::Stats(stats) => assert_eq!(stats.physical_used, 4),
        other => panic!("unexpected response {:?}", other),
    }
}

#[test]
fn test_reset_empties_everything() {
    let mut engine = engine(6, ScalingPolicy::Lru);
    alloc(&mut engine, 1, 6);
    alloc(&mut engine, 2, 3);
    engine.reset();

    assert_eq!(engine.physical().free_count(), 6);
    assert_eq!(engine.swap().free_count(), 6);
    assert!(engine.allocation_order().is_empty());
    assert_eq!(engine.policy(), ScalingPolicy::Lru);
    engine.verify().unwrap();
}
