/*!
 * Contiguous Placement Tests
 * First-Fit, Best-Fit and Worst-Fit against real store layouts
 */

use super::common::{alloc, engine, switch};
use memsim_kernel::memory::{
    MemoryEngine, MemoryError, ProcessRef, ScalingPolicy, Sequence, StoreKind,
};
use pretty_assertions::assert_eq;

const CONTIGUOUS: [ScalingPolicy; 3] = [
    ScalingPolicy::FirstFit,
    ScalingPolicy::BestFit,
    ScalingPolicy::WorstFit,
];

/// 10 blocks with free runs of 3 (at 1) and 4 (at 5)
fn fragmented(policy: ScalingPolicy) -> MemoryEngine {
    let mut engine = engine(10, ScalingPolicy::FirstFit);
    alloc(&mut engine, 1, 1);
    alloc(&mut engine, 2, 3);
    alloc(&mut engine, 3, 1);
    alloc(&mut engine, 4, 4);
    alloc(&mut engine, 5, 1);
    engine.release(2);
    engine.release(4);
    switch(&mut engine, policy);
    engine
}

#[test]
fn test_free_runs_of_fragmented_store() {
    let engine = fragmented(ScalingPolicy::FirstFit);
    assert_eq!(
        engine.free_runs(StoreKind::Physical),
        vec![
            Sequence {
                start: 1,
                length: 3
            },
            Sequence {
                start: 5,
                length: 4
            },
        ]
    );
}

#[test]
fn test_fragmentation_rejected_by_every_contiguous_policy() {
    for policy in CONTIGUOUS {
        let mut engine = fragmented(policy);
        let before = engine.snapshot();

        let err = engine.allocate(ProcessRef::new(9, 0), 5).unwrap_err();
        assert_eq!(
            err,
            MemoryError::Fragmented {
                requested: 5,
                free: 7,
                largest_run: 4
            },
            "{}",
            policy
        );
        let after = engine.snapshot();
        assert_eq!(after.physical, before.physical);
        assert_eq!(after.allocation_order, before.allocation_order);
    }
}

#[test]
fn test_first_fit_takes_earliest_run() {
    let mut engine = fragmented(ScalingPolicy::FirstFit);
    assert_eq!(alloc(&mut engine, 9, 2), vec![1, 2]);
}

#[test]
fn test_best_fit_takes_smallest_qualifying_run() {
    let mut engine = fragmented(ScalingPolicy::BestFit);
    assert_eq!(alloc(&mut engine, 9, 4), vec![5, 6, 7, 8]);

    let mut engine = fragmented(ScalingPolicy::BestFit);
    assert_eq!(alloc(&mut engine, 9, 2), vec![1, 2]);
}

#[test]
fn test_worst_fit_takes_largest_run() {
    let mut engine = fragmented(ScalingPolicy::WorstFit);
    assert_eq!(alloc(&mut engine, 9, 2), vec![5, 6]);
}

#[test]
fn test_ties_go_to_earliest_start() {
    // Two free runs of 2 at 0 and 3
    let mut setup = engine(6, ScalingPolicy::FirstFit);
    alloc(&mut setup, 1, 2);
    alloc(&mut setup, 2, 1);
    alloc(&mut setup, 3, 2);
    alloc(&mut setup, 4, 1);
    setup.release(1);
    setup.release(3);

    for policy in [ScalingPolicy::BestFit, ScalingPolicy::WorstFit] {
        let mut engine = engine(6, policy);
        engine.restore(setup.snapshot()).unwrap();
        switch(&mut engine, policy);
        assert_eq!(alloc(&mut engine, 9, 2), vec![0, 1], "{}", policy);
    }
}

#[test]
fn test_contiguous_never_evicts() {
    for policy in CONTIGUOUS {
        let mut engine = engine(4, policy);
        alloc(&mut engine, 1, 4);
        let err = engine.allocate(ProcessRef::new(2, 0), 1).unwrap_err();
        assert!(
            matches!(err, MemoryError::InsufficientCapacity { requested: 1, physical_free: 0, swap_free: 4 }),
            "{}: {:?}",
            policy,
            err
        );
        assert_eq!(engine.swap().occupied_count(), 0);
    }
}
