/*!
 * Memory Traits
 * Seams between the engine, its policies and the host
 */

use super::order::AllocationOrder;
use super::types::{EvictionPolicy, ProcessRef, Sequence};
use crate::core::types::{BlockCount, Pid};
use rand::RngCore;

/// Contiguous placement strategy
pub trait PlacementStrategy: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Choose the free run to place `required` blocks in
    ///
    /// `runs` are in address order. Returns `None` when no run is long enough.
    fn select(&self, runs: &[Sequence], required: BlockCount) -> Option<Sequence>;
}

/// Victim selection for paged replacement
pub trait ReplacementPolicy: Send + Sync {
    fn kind(&self) -> EvictionPolicy;

    /// Pick the process to evict from physical memory
    ///
    /// `candidates` are the physically resident processes that may be evicted,
    /// in order of their lowest physical slot. `order` is the allocation order
    /// tracker. Returns `None` when there is nothing to evict.
    fn select_victim(
        &self,
        candidates: &[&ProcessRef],
        order: &AllocationOrder,
        rng: &mut dyn RngCore,
    ) -> Option<Pid>;
}

/// Host-side process lifecycle, consulted on release and policy changes
#[cfg_attr(test, mockall::automock)]
pub trait ProcessLifecycle {
    /// Whether the host considers `pid` finished
    fn is_finished(&self, pid: Pid) -> bool;

    /// Stop every in-flight process (sent before a policy switch takes effect)
    fn stop_all(&mut self);
}
