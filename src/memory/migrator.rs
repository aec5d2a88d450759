/*!
 * Migrator
 * Moves occupied slots between physical memory and swap
 *
 * Every function either completes or returns an error before touching any
 * slot, so no process is ever left half-migrated.
 */

use super::replacement::select_victim;
use super::state::EngineState;
use super::traits::ReplacementPolicy;
use super::types::{BlockLocation, MemoryError, MemoryResult, StoreKind};
use crate::core::types::{BlockIndex, Pid, Timestamp};
use log::{debug, info};
use rand::RngCore;

/// One block brought into physical memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwapIn {
    pub swap_index: BlockIndex,
    pub physical_index: BlockIndex,
    pub evicted: Option<Pid>,
}

/// Move the occupant of one physical slot into the first free swap slot
///
/// Returns the swap index used.
pub(crate) fn move_to_swap(state: &mut EngineState, slot: BlockIndex) -> MemoryResult<BlockIndex> {
    let pid = state.physical.occupant(slot).ok_or_else(|| {
        MemoryError::InvalidRequest(format!("physical slot {} is not occupied", slot))
    })?;
    let swap_index = state.swap.first_free().ok_or(MemoryError::SwapExhausted {
        required: 1,
        available: 0,
    })?;

    state.physical.clear(slot);
    state.swap.assign(swap_index, pid)?;

    if let Some(process) = state.processes.get_mut(&pid) {
        let from = BlockLocation::physical(slot);
        if let Some(block) = process.blocks.iter_mut().find(|b| **b == from) {
            *block = BlockLocation::swap(swap_index);
        }
        process.in_swap = true;
    }
    state.settle(pid);

    debug!("Moved PID {} from physical {} to swap {}", pid, slot, swap_index);
    Ok(swap_index)
}

/// Move every physical block of `pid` to swap, or nothing at all
///
/// Returns (physical index, swap index) pairs.
pub(crate) fn move_blocks_to_swap(
    state: &mut EngineState,
    pid: Pid,
) -> MemoryResult<Vec<(BlockIndex, BlockIndex)>> {
    let slots = state.physical.indices_of(pid);
    if slots.is_empty() {
        return Err(MemoryError::NotResident(pid));
    }

    let available = state.swap.free_count();
    if available < slots.len() {
        return Err(MemoryError::SwapExhausted {
            required: slots.len(),
            available,
        });
    }

    let mut moves = Vec::with_capacity(slots.len());
    for slot in slots {
        let swap_index = move_to_swap(state, slot)?;
        moves.push((slot, swap_index));
    }

    info!(
        "Evicted PID {} to swap ({} blocks, {} swap blocks left)",
        pid,
        moves.len(),
        state.swap.free_count()
    );
    Ok(moves)
}

/// Bring the block at `swap_index` into physical memory
///
/// With no free physical slot a victim other than the incoming process is
/// evicted through `policy`; `None` means the active mode never evicts.
pub(crate) fn move_to_physical(
    state: &mut EngineState,
    swap_index: BlockIndex,
    policy: Option<&dyn ReplacementPolicy>,
    rng: &mut dyn RngCore,
    now: Timestamp,
) -> MemoryResult<SwapIn> {
    let pid = state.swap.occupant(swap_index).ok_or_else(|| {
        MemoryError::InvalidRequest(format!("swap slot {} is not occupied", swap_index))
    })?;

    let mut evicted = None;
    if state.physical.is_full() {
        let no_room = || MemoryError::InsufficientCapacity {
            requested: 1,
            physical_free: 0,
            swap_free: state.swap.free_count(),
        };
        let policy = policy.ok_or_else(no_room)?;
        let victim = select_victim(state, policy, Some(pid), rng).ok_or_else(no_room)?;

        // The incoming block frees its swap slot before the victim moves out
        let required = state.physical.indices_of(victim).len();
        let available = state.swap.free_count() + 1;
        if required > available {
            return Err(MemoryError::SwapExhausted {
                required,
                available,
            });
        }

        state.swap.clear(swap_index);
        move_blocks_to_swap(state, victim)?;
        evicted = Some(victim);
    } else {
        state.swap.clear(swap_index);
    }

    let physical_index = state.physical.first_free().ok_or(MemoryError::InsufficientCapacity {
        requested: 1,
        physical_free: 0,
        swap_free: state.swap.free_count(),
    })?;
    state.physical.assign(physical_index, pid)?;

    if let Some(process) = state.processes.get_mut(&pid) {
        let from = BlockLocation::swap(swap_index);
        process.blocks.retain(|b| *b != from);
        process.blocks.push(BlockLocation::physical(physical_index));
        process.touch(now);
    }
    state.settle(pid);

    debug!(
        "Moved PID {} from swap {} to physical {}{}",
        pid,
        swap_index,
        physical_index,
        evicted
            .map(|v| format!(" (evicted PID {})", v))
            .unwrap_or_default()
    );
    Ok(SwapIn {
        swap_index,
        physical_index,
        evicted,
    })
}

/// Bring every swapped block of `pid` into physical memory
///
/// All of its swap slots are freed before any victim moves out, so victims
/// can land in them. Returns (swap index, physical index) pairs and the
/// evicted processes.
pub(crate) fn move_process_to_physical(
    state: &mut EngineState,
    pid: Pid,
    policy: Option<&dyn ReplacementPolicy>,
    rng: &mut dyn RngCore,
    now: Timestamp,
) -> MemoryResult<(Vec<(BlockIndex, BlockIndex)>, Vec<Pid>)> {
    let swapped: Vec<BlockIndex> = state
        .processes
        .get(&pid)
        .map(|p| p.swap_blocks().collect())
        .ok_or(MemoryError::NotResident(pid))?;

    let required = swapped.len();
    let no_room = MemoryError::InsufficientCapacity {
        requested: required,
        physical_free: state.physical.free_count(),
        swap_free: state.swap.free_count(),
    };

    for &index in &swapped {
        state.swap.clear(index);
    }

    let mut evicted = Vec::new();
    while state.physical.free_count() < required {
        let victim = policy
            .and_then(|policy| select_victim(state, policy, Some(pid), rng))
            .ok_or_else(|| no_room.clone())?;
        move_blocks_to_swap(state, victim)?;
        evicted.push(victim);
    }

    let targets = state.physical.free_indices();
    let moved: Vec<(BlockIndex, BlockIndex)> = swapped.into_iter().zip(targets).collect();
    for &(_, physical_index) in &moved {
        state.physical.assign(physical_index, pid)?;
    }

    if let Some(process) = state.processes.get_mut(&pid) {
        process.blocks.retain(|b| b.store != StoreKind::Swap);
        process
            .blocks
            .extend(moved.iter().map(|&(_, i)| BlockLocation::physical(i)));
        process.touch(now);
    }
    state.settle(pid);

    debug!(
        "Moved PID {} back from swap: {:?}{}",
        pid,
        moved,
        if evicted.is_empty() {
            String::new()
        } else {
            format!(" (evicted {:?})", evicted)
        }
    );
    Ok((moved, evicted))
}
