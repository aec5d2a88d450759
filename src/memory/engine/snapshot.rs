/*!
 * Snapshots
 * Serialize and restore the complete engine state
 */

use super::{MemoryEngine, PendingAllocation};
use crate::core::types::{Pid, Timestamp};
use crate::core::{bincode, json};
use crate::memory::order::AllocationOrder;
use crate::memory::state::EngineState;
use crate::memory::store::BlockStore;
use crate::memory::types::{
    MemoryError, MemoryResult, ProcessRef, ScalingPolicy, Slot, StoreKind,
};
use ahash::{AHashSet, RandomState};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything needed to rebuild an engine
///
/// The host owns storage; the engine only produces and accepts these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub physical: Vec<Slot>,
    pub swap: Vec<Slot>,
    pub policy: ScalingPolicy,
    pub allocation_order: Vec<Pid>,
    /// Sorted by id
    pub processes: Vec<ProcessRef>,
    pub clock: Timestamp,
    #[serde(default)]
    pub pending: Option<PendingAllocation>,
}

impl MemoryEngine {
    pub fn snapshot(&self) -> EngineSnapshot {
        let mut processes: Vec<ProcessRef> = self.state.processes.values().cloned().collect();
        processes.sort_by_key(|p| p.id);

        EngineSnapshot {
            physical: self.state.physical.slots().to_vec(),
            swap: self.state.swap.slots().to_vec(),
            policy: self.policy,
            allocation_order: self.state.order.to_vec(),
            processes,
            clock: self.clock,
            pending: self.pending.clone(),
        }
    }

    /// Replace the engine state with `snapshot`
    ///
    /// The snapshot is fully validated first; an inconsistent one is
    /// rejected and the current state kept.
    pub fn restore(&mut self, snapshot: EngineSnapshot) -> MemoryResult<()> {
        let state = rebuild(snapshot.physical, snapshot.swap, snapshot.allocation_order, snapshot.processes)
            .inspect_err(|err| warn!("Rejected snapshot: {}", err))?;

        info!(
            "Restored snapshot: {} processes, {} of {} physical blocks used, policy {}",
            state.processes.len(),
            state.physical.occupied_count(),
            state.physical.len(),
            snapshot.policy.description()
        );

        self.state = state;
        self.policy = snapshot.policy;
        self.clock = snapshot.clock;
        self.pending = snapshot.pending;
        self.clock_interrupt.reset();
        Ok(())
    }

    pub fn to_json(&self) -> MemoryResult<Vec<u8>> {
        Ok(json::to_vec(&self.snapshot())?)
    }

    pub fn from_json(&mut self, bytes: &[u8]) -> MemoryResult<()> {
        let snapshot: EngineSnapshot = json::from_slice(bytes)?;
        self.restore(snapshot)
    }

    pub fn to_bincode(&self) -> MemoryResult<Vec<u8>> {
        Ok(bincode::to_vec(&self.snapshot())?)
    }

    pub fn from_bincode(&mut self, bytes: &[u8]) -> MemoryResult<()> {
        let snapshot: EngineSnapshot = bincode::from_slice(bytes)?;
        self.restore(snapshot)
    }
}

fn rebuild(
    physical: Vec<Slot>,
    swap: Vec<Slot>,
    allocation_order: Vec<Pid>,
    processes: Vec<ProcessRef>,
) -> MemoryResult<EngineState> {
    let mut seen = AHashSet::new();
    if let Some(pid) = allocation_order.iter().find(|pid| !seen.insert(**pid)) {
        return Err(MemoryError::InvalidSnapshot(format!(
            "allocation order lists process {} twice",
            pid
        )));
    }

    let mut table = HashMap::with_capacity_and_hasher(processes.len(), RandomState::new());
    for process in processes {
        let id = process.id;
        if table.insert(id, process).is_some() {
            return Err(MemoryError::InvalidSnapshot(format!(
                "process {} appears twice",
                id
            )));
        }
    }

    let state = EngineState {
        physical: BlockStore::from_slots(StoreKind::Physical, physical)?,
        swap: BlockStore::from_slots(StoreKind::Swap, swap)?,
        order: allocation_order.into_iter().collect::<AllocationOrder>(),
        processes: table,
    };
    state.verify()?;
    Ok(state)
}
