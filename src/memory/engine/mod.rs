/*!
 * Memory Engine
 * Orchestrates block stores, policies and migration behind one transactional API
 *
 * Every mutating operation runs against the engine state inside a
 * transaction: the state is snapshotted in memory, the operation runs, and
 * any error restores the snapshot before it is returned. Callers never
 * observe a partially applied request.
 */

mod allocate;
mod migrate;
mod release;
mod request;
mod snapshot;

pub use allocate::{PendingAllocation, PolicyChange};
pub use request::{Request, Response};
pub use snapshot::EngineSnapshot;

use super::clock::ClockInterrupt;
use super::order::AllocationOrder;
use super::state::EngineState;
use super::store::BlockStore;
use super::types::{
    BlockLocation, MemoryPressure, MemoryResult, MemoryStats, ProcessRef, ScalingPolicy, Sequence,
    StoreKind,
};
use crate::core::config::EngineConfig;
use crate::core::types::{Pid, Timestamp};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Block memory engine
///
/// Owns both block stores, the allocation order, the process table and the
/// active scaling policy. Single-threaded; wrap it in
/// [`SharedEngine`](crate::memory::SharedEngine) to share across threads.
#[derive(Debug)]
pub struct MemoryEngine {
    state: EngineState,
    policy: ScalingPolicy,
    rng: StdRng,
    /// Logical clock, advanced once per committed transaction
    clock: Timestamp,
    pending: Option<PendingAllocation>,
    clock_interrupt: ClockInterrupt,
}

impl MemoryEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Memory engine initialized: {} physical blocks, {} swap blocks, policy {}{}",
            config.physical_blocks,
            config.swap_blocks,
            config.policy.description(),
            config
                .seed
                .map(|s| format!(", seed {}", s))
                .unwrap_or_default()
        );

        Self {
            state: EngineState::new(config.physical_blocks, config.swap_blocks),
            policy: config.policy,
            rng,
            clock: 0,
            pending: None,
            clock_interrupt: ClockInterrupt::new(config.clock_interrupt_interval),
        }
    }

    /// Run `op` against the state, restoring it if `op` fails
    ///
    /// `op` receives the timestamp the transaction commits at.
    fn transact<T, F>(&mut self, op: F) -> MemoryResult<T>
    where
        F: FnOnce(&mut EngineState, &mut StdRng, Timestamp) -> MemoryResult<T>,
    {
        let backup = self.state.clone();
        let now = self.clock + 1;

        match op(&mut self.state, &mut self.rng, now) {
            Ok(value) => {
                self.clock = now;
                Ok(value)
            }
            Err(err) => {
                self.state = backup;
                Err(err)
            }
        }
    }

    /// Empty both stores and forget every process; the policy is kept
    pub fn reset(&mut self) {
        self.state.reset();
        self.pending = None;
        self.clock = 0;
        self.clock_interrupt.reset();
        info!("Memory engine reset ({})", self.policy.description());
    }

    pub fn policy(&self) -> ScalingPolicy {
        self.policy
    }

    pub fn physical(&self) -> &BlockStore {
        &self.state.physical
    }

    pub fn swap(&self) -> &BlockStore {
        &self.state.swap
    }

    pub fn store(&self, kind: StoreKind) -> &BlockStore {
        self.state.store(kind)
    }

    pub fn allocation_order(&self) -> &AllocationOrder {
        &self.state.order
    }

    pub fn process(&self, pid: Pid) -> Option<&ProcessRef> {
        self.state.processes.get(&pid)
    }

    /// Processes holding at least one block, by id
    pub fn processes(&self) -> Vec<&ProcessRef> {
        let mut processes: Vec<&ProcessRef> = self.state.processes.values().collect();
        processes.sort_by_key(|p| p.id);
        processes
    }

    /// Slots held by `pid`, empty for unknown processes
    pub fn blocks_of(&self, pid: Pid) -> &[BlockLocation] {
        self.state
            .processes
            .get(&pid)
            .map(|p| p.blocks.as_slice())
            .unwrap_or(&[])
    }

    pub fn free_runs(&self, kind: StoreKind) -> Vec<Sequence> {
        self.state.store(kind).free_runs()
    }

    pub fn pending(&self) -> Option<&PendingAllocation> {
        self.pending.as_ref()
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    /// Check every cross-structure invariant of the current state
    pub fn verify(&self) -> MemoryResult<()> {
        self.state.verify()
    }

    pub fn stats(&self) -> MemoryStats {
        let physical = &self.state.physical;
        let swap = &self.state.swap;
        let runs = physical.free_runs();

        let total = physical.len() + swap.len();
        let used = physical.occupied_count() + swap.occupied_count();
        let usage_percentage = if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MemoryStats {
            physical_total: physical.len(),
            physical_used: physical.occupied_count(),
            swap_total: swap.len(),
            swap_used: swap.occupied_count(),
            resident_processes: self.state.order.len(),
            swapped_processes: self.state.processes.values().filter(|p| p.in_swap).count(),
            free_runs: runs.len(),
            largest_free_run: runs.iter().map(|r| r.length).max().unwrap_or(0),
            usage_percentage,
        }
    }

    /// Warn once usage crosses the high-pressure threshold
    fn check_pressure(&self) {
        let stats = self.stats();
        let pressure = stats.memory_pressure();
        if pressure >= MemoryPressure::High {
            warn!(
                "Memory pressure {}: {:.1}% of {} blocks in use",
                pressure,
                stats.usage_percentage,
                stats.physical_total + stats.swap_total
            );
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
