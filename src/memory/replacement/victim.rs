/*!
 * Victim Selector
 * Chooses which resident process leaves physical memory
 */

use super::super::order::AllocationOrder;
use super::super::state::EngineState;
use super::super::traits::ReplacementPolicy;
use super::super::types::{EvictionPolicy, ProcessRef};
use crate::core::types::Pid;
use rand::seq::SliceRandom;
use rand::RngCore;

/// Oldest entry of the allocation order
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoReplacement;

/// Smallest last-access time; ties go to the older process, then the lower id
#[derive(Debug, Default, Clone, Copy)]
pub struct LruReplacement;

/// Uniform pick inside the lowest non-empty (referenced, modified) class
#[derive(Debug, Default, Clone, Copy)]
pub struct NruReplacement;

impl ReplacementPolicy for FifoReplacement {
    fn kind(&self) -> EvictionPolicy {
        EvictionPolicy::Fifo
    }

    fn select_victim(
        &self,
        candidates: &[&ProcessRef],
        order: &AllocationOrder,
        _rng: &mut dyn RngCore,
    ) -> Option<Pid> {
        // The head may be excluded from candidates (e.g. the process being swapped in)
        order
            .iter()
            .find(|pid| candidates.iter().any(|c| c.id == *pid))
    }
}

impl ReplacementPolicy for LruReplacement {
    fn kind(&self) -> EvictionPolicy {
        EvictionPolicy::Lru
    }

    fn select_victim(
        &self,
        candidates: &[&ProcessRef],
        _order: &AllocationOrder,
        _rng: &mut dyn RngCore,
    ) -> Option<Pid> {
        candidates
            .iter()
            .min_by_key(|p| (p.last_accessed, p.created_at, p.id))
            .map(|p| p.id)
    }
}

impl ReplacementPolicy for NruReplacement {
    fn kind(&self) -> EvictionPolicy {
        EvictionPolicy::Nru
    }

    fn select_victim(
        &self,
        candidates: &[&ProcessRef],
        _order: &AllocationOrder,
        rng: &mut dyn RngCore,
    ) -> Option<Pid> {
        let lowest = candidates.iter().map(|p| p.page_class).min()?;
        let class: Vec<Pid> = candidates
            .iter()
            .filter(|p| p.page_class == lowest)
            .map(|p| p.id)
            .collect();
        class.choose(rng).copied()
    }
}

static FIFO: FifoReplacement = FifoReplacement;
static LRU: LruReplacement = LruReplacement;
static NRU: NruReplacement = NruReplacement;

/// Replacement policy implementing `policy`
pub fn policy_for(policy: EvictionPolicy) -> &'static dyn ReplacementPolicy {
    match policy {
        EvictionPolicy::Fifo => &FIFO,
        EvictionPolicy::Lru => &LRU,
        EvictionPolicy::Nru => &NRU,
    }
}

/// Pick a victim among the resident processes of `state`, never `exclude`
pub(crate) fn select_victim(
    state: &EngineState,
    policy: &dyn ReplacementPolicy,
    exclude: Option<Pid>,
    rng: &mut dyn RngCore,
) -> Option<Pid> {
    let candidates = state.resident_candidates(exclude);
    policy.select_victim(&candidates, &state.order, rng)
}
