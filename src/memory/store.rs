/*!
 * Block Store
 * Fixed-length array of block slots, used for both physical memory and swap
 */

use super::types::{MemoryError, MemoryResult, Sequence, Slot, StoreKind};
use crate::core::types::{BlockCount, BlockIndex, Pid};
use serde::{Deserialize, Serialize};

/// Ordered, fixed-size store of block slots
///
/// The slot count is set at construction and never changes; `reset` only
/// empties the slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStore {
    kind: StoreKind,
    slots: Vec<Slot>,
}

impl BlockStore {
    pub fn new(kind: StoreKind, len: BlockCount) -> Self {
        Self {
            kind,
            slots: (0..len).map(Slot::empty).collect(),
        }
    }

    /// Rebuild a store from persisted slots, checking that indices are 0..N in order
    pub fn from_slots(kind: StoreKind, slots: Vec<Slot>) -> MemoryResult<Self> {
        if let Some(bad) = slots.iter().enumerate().find(|(i, s)| s.index != *i) {
            return Err(MemoryError::InvalidSnapshot(format!(
                "{} slot at position {} carries index {}",
                kind, bad.0, bad.1.index
            )));
        }
        Ok(Self { kind, slots })
    }

    #[inline]
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> BlockCount {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn occupant(&self, index: BlockIndex) -> Option<Pid> {
        self.slots.get(index).and_then(|s| s.occupant)
    }

    pub fn free_count(&self) -> BlockCount {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    pub fn occupied_count(&self) -> BlockCount {
        self.len() - self.free_count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| !s.is_free())
    }

    /// Free slot indices in ascending order
    pub fn free_indices(&self) -> Vec<BlockIndex> {
        self.slots
            .iter()
            .filter(|s| s.is_free())
            .map(|s| s.index)
            .collect()
    }

    pub fn first_free(&self) -> Option<BlockIndex> {
        self.slots.iter().find(|s| s.is_free()).map(|s| s.index)
    }

    /// Slot indices held by `pid`, ascending
    pub fn indices_of(&self, pid: Pid) -> Vec<BlockIndex> {
        self.slots
            .iter()
            .filter(|s| s.occupant == Some(pid))
            .map(|s| s.index)
            .collect()
    }

    /// Distinct occupants in order of their lowest slot
    pub fn occupants(&self) -> Vec<Pid> {
        let mut seen = Vec::new();
        for pid in self.slots.iter().filter_map(|s| s.occupant) {
            if !seen.contains(&pid) {
                seen.push(pid);
            }
        }
        seen
    }

    /// Put `pid` into a free slot
    pub fn assign(&mut self, index: BlockIndex, pid: Pid) -> MemoryResult<()> {
        let kind = self.kind;
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            MemoryError::InvalidRequest(format!("{} slot {} out of range", kind, index))
        })?;
        if let Some(current) = slot.occupant {
            return Err(MemoryError::InvalidRequest(format!(
                "{} slot {} already held by process {}",
                kind, index, current
            )));
        }
        slot.occupant = Some(pid);
        Ok(())
    }

    /// Empty a slot, returning its previous occupant
    pub fn clear(&mut self, index: BlockIndex) -> Option<Pid> {
        self.slots.get_mut(index).and_then(|s| s.occupant.take())
    }

    /// Empty every slot held by `pid`, returning the freed indices
    pub fn release(&mut self, pid: Pid) -> Vec<BlockIndex> {
        let mut freed = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| s.occupant == Some(pid)) {
            slot.occupant = None;
            freed.push(slot.index);
        }
        freed
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.occupant = None;
        }
    }

    /// Maximal runs of free slots, in address order
    pub fn free_runs(&self) -> Vec<Sequence> {
        scan_free_runs(&self.slots)
    }

    pub fn largest_free_run(&self) -> BlockCount {
        self.free_runs().iter().map(|r| r.length).max().unwrap_or(0)
    }
}

/// Compute the ordered list of maximal free-slot runs
pub fn scan_free_runs(slots: &[Slot]) -> Vec<Sequence> {
    let mut runs = Vec::new();
    let mut current: Option<Sequence> = None;

    for slot in slots {
        if slot.is_free() {
            match current.as_mut() {
                Some(run) => run.length += 1,
                None => {
                    current = Some(Sequence {
                        start: slot.index,
                        length: 1,
                    })
                }
            }
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }

    runs.extend(current);
    runs
}
