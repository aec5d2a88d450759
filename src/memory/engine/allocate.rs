/*!
 * Allocation
 * Policy dispatch for new allocations and policy changes
 */

use super::MemoryEngine;
use crate::core::types::{BlockCount, Timestamp};
use crate::memory::placement::{place_contiguous, strategy_for};
use crate::memory::replacement::{allocate_paged, policy_for};
use crate::memory::state::EngineState;
use crate::memory::traits::ProcessLifecycle;
use crate::memory::types::{
    AllocationOutcome, BlockLocation, MemoryError, MemoryResult, ProcessRef, ScalingPolicy,
};
use log::{info, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// The most recent allocation that failed, retried on the next policy change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAllocation {
    pub process: ProcessRef,
    pub required: BlockCount,
}

/// Result of switching the scaling policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyChange {
    pub previous: ScalingPolicy,
    pub current: ScalingPolicy,
    /// Outcome of re-running the pending allocation, if there was one
    pub retried: Option<Result<AllocationOutcome, MemoryError>>,
}

impl MemoryEngine {
    /// Allocate `required` blocks to `process` under the active policy
    ///
    /// A process that already holds blocks has its previous placement
    /// replaced. On failure nothing changes except the pending allocation,
    /// which becomes this request.
    pub fn allocate(
        &mut self,
        process: ProcessRef,
        required: BlockCount,
    ) -> MemoryResult<AllocationOutcome> {
        let pid = process.id;
        let policy = self.policy;
        let request = process.clone();

        let result =
            self.transact(|state, rng, now| allocate_in(state, policy, request, required, rng, now));

        match &result {
            Ok(outcome) => {
                if self.pending.as_ref().is_some_and(|p| p.process.id == pid) {
                    self.pending = None;
                }
                info!(
                    "{}: allocated {} blocks to PID {}{}",
                    policy.description(),
                    required,
                    pid,
                    if outcome.evicted.is_empty() {
                        String::new()
                    } else {
                        format!(", evicted {:?}", outcome.evicted)
                    }
                );
                self.check_pressure();
            }
            Err(err) => {
                warn!(
                    "{}: allocation of {} blocks for PID {} failed: {}",
                    policy.description(),
                    required,
                    pid,
                    err
                );
                self.pending = Some(PendingAllocation { process, required });
            }
        }

        result
    }

    /// Switch the scaling policy
    ///
    /// Asks the host to stop every process, then re-runs the pending
    /// allocation under the new policy. Placed processes stay where they are.
    pub fn set_policy(
        &mut self,
        policy: ScalingPolicy,
        lifecycle: &mut dyn ProcessLifecycle,
    ) -> PolicyChange {
        lifecycle.stop_all();

        let previous = std::mem::replace(&mut self.policy, policy);
        info!(
            "Scaling policy changed: {} -> {}",
            previous.description(),
            policy.description()
        );

        let retried = self
            .pending
            .take()
            .map(|pending| self.allocate(pending.process, pending.required));

        PolicyChange {
            previous,
            current: policy,
            retried,
        }
    }
}

fn allocate_in(
    state: &mut EngineState,
    policy: ScalingPolicy,
    mut process: ProcessRef,
    required: BlockCount,
    rng: &mut StdRng,
    now: Timestamp,
) -> MemoryResult<AllocationOutcome> {
    let pid = process.id;
    if required == 0 {
        return Err(MemoryError::InvalidRequest(format!(
            "PID {} requested zero blocks",
            pid
        )));
    }

    state.release(pid);

    let physical_free = state.physical.free_count();
    let swap_free = state.swap.free_count();
    if required > physical_free + swap_free {
        return Err(MemoryError::InsufficientCapacity {
            requested: required,
            physical_free,
            swap_free,
        });
    }

    let (indices, evicted) = match policy.eviction() {
        Some(eviction) => {
            let placed = allocate_paged(state, pid, required, policy_for(eviction), rng)?;
            (placed.indices, placed.evicted)
        }
        None => {
            let strategy = strategy_for(policy).ok_or_else(|| {
                MemoryError::InvalidRequest(format!("{} has no placement strategy", policy))
            })?;
            let indices = place_contiguous(&mut state.physical, strategy, pid, required)
                .map_err(|err| match err {
                    MemoryError::InsufficientCapacity {
                        requested,
                        physical_free,
                        ..
                    } => MemoryError::InsufficientCapacity {
                        requested,
                        physical_free,
                        swap_free,
                    },
                    other => other,
                })?;
            (indices, Vec::new())
        }
    };

    process.blocks = indices.into_iter().map(BlockLocation::physical).collect();
    process.in_swap = false;
    process.touch(now);
    state.processes.insert(pid, process);
    state.settle(pid);

    let process = state
        .processes
        .get(&pid)
        .cloned()
        .ok_or(MemoryError::NotResident(pid))?;

    Ok(AllocationOutcome {
        process,
        evicted,
        physical: state.physical.slots().to_vec(),
        swap: state.swap.slots().to_vec(),
    })
}
