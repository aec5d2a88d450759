/*!
 * Engine State
 * Both block stores, the allocation order and the process table
 */

use super::order::AllocationOrder;
use super::store::BlockStore;
use super::types::{BlockLocation, MemoryError, MemoryResult, ProcessRef, StoreKind};
use crate::core::types::{BlockCount, Pid};
use ahash::RandomState;
use std::collections::HashMap;

/// Mutable state the engine runs its transactions against
///
/// The process table holds exactly the processes that occupy at least one
/// slot in either store.
#[derive(Debug, Clone)]
pub(crate) struct EngineState {
    pub physical: BlockStore,
    pub swap: BlockStore,
    pub order: AllocationOrder,
    pub processes: HashMap<Pid, ProcessRef, RandomState>,
}

impl EngineState {
    pub fn new(physical_blocks: BlockCount, swap_blocks: BlockCount) -> Self {
        Self {
            physical: BlockStore::new(StoreKind::Physical, physical_blocks),
            swap: BlockStore::new(StoreKind::Swap, swap_blocks),
            order: AllocationOrder::new(),
            processes: HashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn store(&self, kind: StoreKind) -> &BlockStore {
        match kind {
            StoreKind::Physical => &self.physical,
            StoreKind::Swap => &self.swap,
        }
    }

    pub fn free_total(&self) -> BlockCount {
        self.physical.free_count() + self.swap.free_count()
    }

    /// Physically resident processes in slot order, minus `exclude`
    pub fn resident_candidates(&self, exclude: Option<Pid>) -> Vec<&ProcessRef> {
        self.physical
            .occupants()
            .into_iter()
            .filter(|&pid| Some(pid) != exclude)
            .filter_map(|pid| self.processes.get(&pid))
            .collect()
    }

    /// Re-derive order membership and table presence for `pid` after its slots moved
    pub fn settle(&mut self, pid: Pid) {
        let Some(process) = self.processes.get_mut(&pid) else {
            self.order.remove(pid);
            return;
        };
        process.refresh_swap_flag();
        if process.blocks.is_empty() {
            self.processes.remove(&pid);
            self.order.remove(pid);
        } else if process.is_resident() {
            self.order.push(pid);
        } else {
            self.order.remove(pid);
        }
    }

    /// Free every slot `pid` holds in both stores
    ///
    /// Returns (physical freed, swap freed).
    pub fn release(&mut self, pid: Pid) -> (BlockCount, BlockCount) {
        let physical = self.physical.release(pid).len();
        let swap = self.swap.release(pid).len();
        self.processes.remove(&pid);
        self.order.remove(pid);
        (physical, swap)
    }

    pub fn reset(&mut self) {
        self.physical.reset();
        self.swap.reset();
        self.order.clear();
        self.processes.clear();
    }

    /// Check every cross-structure invariant
    pub fn verify(&self) -> MemoryResult<()> {
        let broken = |msg: String| Err(MemoryError::InvalidSnapshot(msg));

        for store in [&self.physical, &self.swap] {
            for slot in store.slots() {
                let Some(pid) = slot.occupant else { continue };
                let location = BlockLocation {
                    store: store.kind(),
                    index: slot.index,
                };
                match self.processes.get(&pid) {
                    Some(p) if p.blocks.contains(&location) => {}
                    Some(_) => {
                        return broken(format!(
                            "{} slot {} points to process {} which does not record it",
                            store.kind(),
                            slot.index,
                            pid
                        ))
                    }
                    None => {
                        return broken(format!(
                            "{} slot {} points to unknown process {}",
                            store.kind(),
                            slot.index,
                            pid
                        ))
                    }
                }
            }
        }

        for (pid, process) in &self.processes {
            if process.id != *pid {
                return broken(format!("process table key {} holds process {}", pid, process.id));
            }
            if process.blocks.is_empty() {
                return broken(format!("process {} holds no blocks", pid));
            }
            let mut seen = process.blocks.clone();
            seen.sort();
            seen.dedup();
            if seen.len() != process.blocks.len() {
                return broken(format!("process {} records a block twice", pid));
            }
            for block in &process.blocks {
                if self.store(block.store).occupant(block.index) != Some(*pid) {
                    return broken(format!(
                        "process {} records {} slot {} it does not occupy",
                        pid, block.store, block.index
                    ));
                }
            }
            if process.in_swap != process.swap_blocks().next().is_some() {
                return broken(format!("process {} has a stale swap flag", pid));
            }
            if process.is_resident() != self.order.contains(*pid) {
                return broken(format!(
                    "allocation order disagrees with residency of process {}",
                    pid
                ));
            }
        }

        if let Some(pid) = self.order.iter().find(|p| !self.processes.contains_key(p)) {
            return broken(format!("allocation order holds unknown process {}", pid));
        }

        Ok(())
    }
}
