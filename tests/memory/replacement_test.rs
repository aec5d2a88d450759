/*!
 * Paged Replacement Tests
 * FIFO, LRU and NRU eviction scenarios
 */

use super::common::{alloc, engine, seeded_engine};
use memsim_kernel::memory::{
    AccessKind, MemoryEngine, MemoryError, PageClass, ProcessRef, ScalingPolicy,
};
use memsim_kernel::EngineConfig;
use pretty_assertions::assert_eq;

const A: u32 = 1;
const B: u32 = 2;
const C: u32 = 3;

#[test]
fn test_fifo_evicts_oldest_and_reuses_its_slot() {
    let mut engine = engine(2, ScalingPolicy::Fifo);
    let a_slot = alloc(&mut engine, A, 1)[0];
    alloc(&mut engine, B, 1);

    let outcome = engine.allocate(ProcessRef::new(C, 0), 1).unwrap();
    assert_eq!(outcome.evicted, vec![A]);
    assert_eq!(outcome.block_indices(), vec![a_slot]);
    assert_eq!(engine.physical().occupant(a_slot), Some(C));
    assert_eq!(engine.allocation_order().to_vec(), vec![B, C]);
    assert!(engine.process(A).unwrap().in_swap);
    engine.verify().unwrap();
}

#[test]
fn test_fifo_ignores_recent_use() {
    let mut engine = engine(2, ScalingPolicy::Fifo);
    alloc(&mut engine, A, 1);
    alloc(&mut engine, B, 1);
    engine.access(A, AccessKind::Write).unwrap();

    let outcome = engine.allocate(ProcessRef::new(C, 0), 1).unwrap();
    assert_eq!(outcome.evicted, vec![A]);
}

#[test]
fn test_lru_evicts_least_recently_used() {
    let mut engine = engine(2, ScalingPolicy::Lru);
    alloc(&mut engine, A, 1);
    alloc(&mut engine, B, 1);
    engine.access(B, AccessKind::Read).unwrap();

    let outcome = engine.allocate(ProcessRef::new(C, 0), 1).unwrap();
    assert_eq!(outcome.evicted, vec![A]);
    assert!(engine.process(B).unwrap().is_resident());
}

#[test]
fn test_lru_follows_access_not_allocation() {
    let mut engine = engine(2, ScalingPolicy::Lru);
    alloc(&mut engine, A, 1);
    alloc(&mut engine, B, 1);
    engine.access(A, AccessKind::Read).unwrap();

    let outcome = engine.allocate(ProcessRef::new(C, 0), 1).unwrap();
    assert_eq!(outcome.evicted, vec![B]);
}

#[test]
fn test_nru_prefers_class_zero_for_every_seed() {
    for seed in 0..50 {
        let mut engine = seeded_engine(2, ScalingPolicy::Nru, seed);
        alloc(&mut engine, A, 1);
        alloc(&mut engine, B, 1);
        engine.clear_reference_bits();
        engine.access(B, AccessKind::Write).unwrap();
        assert_eq!(engine.process(A).unwrap().page_class, PageClass::Idle);
        assert_eq!(
            engine.process(B).unwrap().page_class,
            PageClass::ReferencedDirty
        );

        let outcome = engine.allocate(ProcessRef::new(C, 0), 1).unwrap();
        assert_eq!(outcome.evicted, vec![A], "seed {}", seed);
    }
}

#[test]
fn test_nru_is_reproducible_with_seed() {
    let run = |seed| {
        let mut engine = seeded_engine(8, ScalingPolicy::Nru, seed);
        for pid in 1..=4 {
            alloc(&mut engine, pid, 2);
        }
        engine.clear_reference_bits();
        engine.allocate(ProcessRef::new(9, 0), 4).unwrap()
    };
    assert_eq!(run(5), run(5));
}

#[test]
fn test_eviction_spans_several_victims() {
    let mut engine = engine(6, ScalingPolicy::Fifo);
    alloc(&mut engine, A, 2);
    alloc(&mut engine, B, 2);
    alloc(&mut engine, C, 2);

    let outcome = engine.allocate(ProcessRef::new(4, 0), 4).unwrap();
    assert_eq!(outcome.evicted, vec![A, B]);
    assert_eq!(engine.allocation_order().to_vec(), vec![C, 4]);
    assert_eq!(engine.swap().occupied_count(), 4);
    engine.verify().unwrap();
}

#[test]
fn test_swap_exhaustion_rolls_back_evictions() {
    let mut engine = MemoryEngine::new(
        EngineConfig::default()
            .with_blocks(4)
            .with_swap_blocks(3)
            .with_policy(ScalingPolicy::Fifo)
            .with_seed(1),
    );
    alloc(&mut engine, A, 2);
    alloc(&mut engine, B, 2);
    // A fits in swap, B no longer does
    let before = engine.snapshot();

    let err = engine.allocate(ProcessRef::new(C, 0), 3).unwrap_err();
    assert_eq!(
        err,
        MemoryError::SwapExhausted {
            required: 2,
            available: 1
        }
    );
    let after = engine.snapshot();
    assert_eq!(after.physical, before.physical);
    assert_eq!(after.swap, before.swap);
    assert_eq!(after.processes, before.processes);
}

#[test]
fn test_paged_request_larger_than_physical() {
    let mut engine = engine(4, ScalingPolicy::Lru);
    let err = engine.allocate(ProcessRef::new(A, 0), 6).unwrap_err();
    assert!(matches!(err, MemoryError::InsufficientCapacity { requested: 6, .. }));
}
