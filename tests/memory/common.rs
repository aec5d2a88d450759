/*!
 * Shared helpers for memory engine tests
 */

use memsim_kernel::memory::{MemoryEngine, ProcessRef, ProcessRegistry, ScalingPolicy};
use memsim_kernel::EngineConfig;

pub fn engine(blocks: usize, policy: ScalingPolicy) -> MemoryEngine {
    seeded_engine(blocks, policy, 42)
}

pub fn seeded_engine(blocks: usize, policy: ScalingPolicy, seed: u64) -> MemoryEngine {
    MemoryEngine::new(
        EngineConfig::default()
            .with_blocks(blocks)
            .with_policy(policy)
            .with_seed(seed),
    )
}

pub fn alloc(engine: &mut MemoryEngine, pid: u32, blocks: usize) -> Vec<usize> {
    let now = engine.clock();
    engine
        .allocate(ProcessRef::new(pid, now), blocks)
        .unwrap()
        .block_indices()
}

/// Switch policy with a throwaway registry
pub fn switch(engine: &mut MemoryEngine, policy: ScalingPolicy) {
    let mut registry = ProcessRegistry::new();
    engine.set_policy(policy, &mut registry);
}
