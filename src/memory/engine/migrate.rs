/*!
 * Migration
 * Swap-out, swap-in, access tracking and reference-bit clearing
 */

use super::MemoryEngine;
use crate::core::types::{BlockIndex, Pid, Timestamp};
use crate::memory::migrator;
use crate::memory::replacement::policy_for;
use crate::memory::state::EngineState;
use crate::memory::traits::ReplacementPolicy;
use crate::memory::types::{AccessKind, MemoryError, MemoryResult, MigrationOutcome};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use std::time::Duration;

impl MemoryEngine {
    /// Move the occupant of physical slot `slot` to swap
    ///
    /// Returns the swap index the block landed in.
    pub fn move_to_swap(&mut self, slot: BlockIndex) -> MemoryResult<BlockIndex> {
        self.transact(|state, _, _| migrator::move_to_swap(state, slot))
            .inspect_err(|err| warn!("Swap-out of physical slot {} failed: {}", slot, err))
    }

    /// Move every physical block of `pid` to swap, all or nothing
    ///
    /// A process with nothing in physical memory is left alone.
    pub fn move_blocks_to_swap(
        &mut self,
        pid: Pid,
    ) -> MemoryResult<Vec<(BlockIndex, BlockIndex)>> {
        match self.transact(|state, _, _| migrator::move_blocks_to_swap(state, pid)) {
            Err(MemoryError::NotResident(_)) => {
                debug!("PID {} has no physical blocks to swap out", pid);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Bring the block in swap slot `swap_index` into physical memory
    ///
    /// Evicts under the active paged policy when physical memory is full.
    pub fn move_to_physical(&mut self, swap_index: BlockIndex) -> MemoryResult<MigrationOutcome> {
        let eviction = self.policy.eviction().map(policy_for);

        self.transact(|state, rng, now| {
            let step = migrator::move_to_physical(state, swap_index, eviction, rng, now)?;
            let process = state
                .physical
                .occupant(step.physical_index)
                .and_then(|pid| state.processes.get(&pid))
                .cloned();
            Ok(MigrationOutcome {
                moved: vec![(step.swap_index, step.physical_index)],
                evicted: step.evicted.into_iter().collect(),
                process,
            })
        })
    }

    /// Bring every swapped block of `pid` back into physical memory
    ///
    /// A process already fully resident only has its reference bit and
    /// access time refreshed. Unknown processes are ignored.
    pub fn bring_to_physical(&mut self, pid: Pid) -> MemoryResult<MigrationOutcome> {
        if !self.state.processes.contains_key(&pid) {
            debug!("Swap-in requested for unknown PID {}", pid);
            return Ok(MigrationOutcome::default());
        }

        let eviction = self.policy.eviction().map(policy_for);
        self.transact(|state, rng, now| swap_in_all(state, pid, eviction, rng, now))
            .inspect(|outcome| {
                if !outcome.moved.is_empty() {
                    info!(
                        "Brought PID {} back into physical memory ({} blocks, evicted {:?})",
                        pid,
                        outcome.moved.len(),
                        outcome.evicted
                    );
                }
            })
            .inspect_err(|err| warn!("Swap-in of PID {} failed: {}", pid, err))
    }

    /// Record that `pid` used its memory
    ///
    /// Swapped blocks come back first. Sets the reference bit, plus the
    /// modified bit on writes.
    pub fn access(&mut self, pid: Pid, kind: AccessKind) -> MemoryResult<MigrationOutcome> {
        if !self.state.processes.contains_key(&pid) {
            debug!("Access by unknown PID {}", pid);
            return Ok(MigrationOutcome::default());
        }

        let eviction = self.policy.eviction().map(policy_for);
        self.transact(|state, rng, now| {
            let mut outcome = swap_in_all(state, pid, eviction, rng, now)?;
            if let Some(process) = state.processes.get_mut(&pid) {
                if kind == AccessKind::Write {
                    process.set_modified(true);
                }
                outcome.process = Some(process.clone());
            }
            Ok(outcome)
        })
    }

    /// Clear the reference bit of every process, resident or swapped
    ///
    /// Returns how many bits were set before the clear.
    pub fn clear_reference_bits(&mut self) -> usize {
        let mut cleared = 0;
        for process in self.state.processes.values_mut() {
            if process.referenced() {
                process.set_referenced(false);
                cleared += 1;
            }
        }
        info!("Clock interrupt: cleared {} reference bits", cleared);
        cleared
    }

    /// Feed the host's elapsed simulation time to the clock interrupt
    ///
    /// Returns true when the interrupt fired and reference bits were cleared.
    pub fn on_clock(&mut self, elapsed: Duration) -> bool {
        if self.clock_interrupt.tick(elapsed, self.policy) {
            self.clear_reference_bits();
            true
        } else {
            false
        }
    }
}

fn swap_in_all(
    state: &mut EngineState,
    pid: Pid,
    eviction: Option<&dyn ReplacementPolicy>,
    rng: &mut StdRng,
    now: Timestamp,
) -> MemoryResult<MigrationOutcome> {
    let (moved, evicted) = migrator::move_process_to_physical(state, pid, eviction, rng, now)?;
    let process = state.processes.get(&pid).cloned();
    Ok(MigrationOutcome {
        moved,
        evicted,
        process,
    })
}
