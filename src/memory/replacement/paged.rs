/*!
 * Paged Allocation
 * Non-contiguous placement that evicts victims to swap when physical memory runs out
 */

use super::super::migrator::move_blocks_to_swap;
use super::super::state::EngineState;
use super::super::traits::ReplacementPolicy;
use super::super::types::{MemoryError, MemoryResult};
use super::victim::select_victim;
use crate::core::types::{BlockCount, BlockIndex, Pid};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::RngCore;

/// Slots chosen for a paged allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PagedPlacement {
    /// Physical indices in allocation order (randomized)
    pub indices: Vec<BlockIndex>,
    /// Victims moved to swap, in eviction order
    pub evicted: Vec<Pid>,
}

/// Allocate `required` physical blocks for `pid`, evicting through `policy` as needed
///
/// Swap is never handed to the incoming process. The caller restores the
/// state if this returns an error after evicting.
pub(crate) fn allocate_paged(
    state: &mut EngineState,
    pid: Pid,
    required: BlockCount,
    policy: &dyn ReplacementPolicy,
    rng: &mut dyn RngCore,
) -> MemoryResult<PagedPlacement> {
    if required > state.physical.len() {
        return Err(MemoryError::InsufficientCapacity {
            requested: required,
            physical_free: state.physical.free_count(),
            swap_free: state.swap.free_count(),
        });
    }

    let mut evicted = Vec::new();
    while state.physical.free_count() < required {
        let Some(victim) = select_victim(state, policy, Some(pid), rng) else {
            return Err(MemoryError::InsufficientCapacity {
                requested: required,
                physical_free: state.physical.free_count(),
                swap_free: state.swap.free_count(),
            });
        };

        if let Err(err) = move_blocks_to_swap(state, victim) {
            warn!(
                "{:?}: cannot evict PID {} for PID {}: {}",
                policy.kind(),
                victim,
                pid,
                err
            );
            return Err(err);
        }
        evicted.push(victim);
    }

    // Uniform draw over the free slots, kept in shuffled order
    let mut free = state.physical.free_indices();
    free.shuffle(rng);
    free.truncate(required);

    for &index in &free {
        state.physical.assign(index, pid)?;
    }

    info!(
        "{:?}: placed PID {} in {} blocks {:?}{}",
        policy.kind(),
        pid,
        required,
        free,
        if evicted.is_empty() {
            String::new()
        } else {
            format!(" after evicting {:?}", evicted)
        }
    );

    Ok(PagedPlacement {
        indices: free,
        evicted,
    })
}
