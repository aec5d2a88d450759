/*!
 * Invariant Property Tests
 * Random request sequences must keep every store and table consistent
 */

use super::common::seeded_engine;
use memsim_kernel::memory::{
    AccessKind, MemoryEngine, ProcessRef, ProcessRegistry, ScalingPolicy,
};
use proptest::collection::vec;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Allocate(u32, usize),
    Release(u32),
    BringBack(u32),
    Access(u32, bool),
    SwapOut(u32),
    ClearBits,
    SetPolicy(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u32..6, 1usize..10).prop_map(|(p, k)| Op::Allocate(p, k)),
        2 => (0u32..6).prop_map(Op::Release),
        1 => (0u32..6).prop_map(Op::BringBack),
        2 => (0u32..6, any::<bool>()).prop_map(|(p, w)| Op::Access(p, w)),
        1 => (0u32..6).prop_map(Op::SwapOut),
        1 => Just(Op::ClearBits),
        1 => (0usize..6).prop_map(Op::SetPolicy),
    ]
}

fn assert_consistent(engine: &MemoryEngine) {
    for store in [engine.physical(), engine.swap()] {
        assert_eq!(store.free_count() + store.occupied_count(), store.len());
    }
    let order = engine.allocation_order().to_vec();
    let mut deduped = order.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), order.len());
    engine.verify().unwrap();
}

fn apply(engine: &mut MemoryEngine, registry: &mut ProcessRegistry, op: &Op) -> bool {
    match *op {
        Op::Allocate(pid, k) => engine.allocate(ProcessRef::new(pid, 0), k).is_ok(),
        Op::Release(pid) => {
            engine.release(pid);
            true
        }
        Op::BringBack(pid) => engine.bring_to_physical(pid).is_ok(),
        Op::Access(pid, write) => {
            let kind = if write { AccessKind::Write } else { AccessKind::Read };
            engine.access(pid, kind).is_ok()
        }
        Op::SwapOut(pid) => engine.move_blocks_to_swap(pid).is_ok(),
        Op::ClearBits => {
            engine.clear_reference_bits();
            true
        }
        Op::SetPolicy(i) => {
            engine.set_policy(ScalingPolicy::ALL[i], registry);
            true
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold_for_random_sequences(
        blocks in 4usize..24,
        policy in 0usize..6,
        seed in any::<u64>(),
        ops in vec(op(), 1..64),
    ) {
        let mut engine = seeded_engine(blocks, ScalingPolicy::ALL[policy], seed);
        let mut registry = ProcessRegistry::new();

        for op in &ops {
            let before = engine.snapshot();
            let ok = apply(&mut engine, &mut registry, op);
            assert_consistent(&engine);

            if !ok {
                let after = engine.snapshot();
                prop_assert_eq!(&after.physical, &before.physical);
                prop_assert_eq!(&after.swap, &before.swap);
                prop_assert_eq!(&after.processes, &before.processes);
                prop_assert_eq!(&after.allocation_order, &before.allocation_order);
            }
        }
    }

    #[test]
    fn prop_release_is_idempotent(
        blocks in 4usize..24,
        policy in 0usize..6,
        sizes in vec(1usize..6, 1..8),
        victim in 0u32..8,
    ) {
        let mut engine = seeded_engine(blocks, ScalingPolicy::ALL[policy], 1);
        for (pid, k) in sizes.into_iter().enumerate() {
            let _ = engine.allocate(ProcessRef::new(pid as u32, 0), k);
        }

        engine.release(victim);
        let once = engine.snapshot();
        engine.release(victim);
        prop_assert_eq!(engine.snapshot(), once);
    }

    #[test]
    fn prop_allocation_respects_combined_capacity(
        blocks in 2usize..16,
        policy in 0usize..6,
        k in 1usize..40,
    ) {
        let mut engine = seeded_engine(blocks, ScalingPolicy::ALL[policy], 9);
        let free = engine.physical().free_count() + engine.swap().free_count();
        let result = engine.allocate(ProcessRef::new(1, 0), k);
        if k > free {
            prop_assert!(result.is_err());
        }
        if let Ok(outcome) = result {
            prop_assert_eq!(outcome.process.blocks.len(), k);
        }
    }
}
