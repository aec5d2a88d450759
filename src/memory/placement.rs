/*!
 * Contiguous Placement
 * First-Fit, Best-Fit and Worst-Fit over the free runs of a store
 *
 * Contiguous policies never evict. When no single run is long enough the
 * request fails even if the store has enough free blocks in total.
 */

use super::store::BlockStore;
use super::traits::PlacementStrategy;
use super::types::{MemoryError, MemoryResult, ScalingPolicy, Sequence};
use crate::core::types::{BlockCount, BlockIndex, Pid};
use log::{debug, info};

/// First run long enough
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFit;

/// Shortest run long enough, earliest on ties
#[derive(Debug, Default, Clone, Copy)]
pub struct BestFit;

/// Longest run, earliest on ties
#[derive(Debug, Default, Clone, Copy)]
pub struct WorstFit;

impl PlacementStrategy for FirstFit {
    fn name(&self) -> &'static str {
        "first_fit"
    }

    fn select(&self, runs: &[Sequence], required: BlockCount) -> Option<Sequence> {
        runs.iter().find(|r| r.length >= required).copied()
    }
}

impl PlacementStrategy for BestFit {
    fn name(&self) -> &'static str {
        "best_fit"
    }

    fn select(&self, runs: &[Sequence], required: BlockCount) -> Option<Sequence> {
        // min_by_key keeps the first of equal minima
        runs.iter()
            .filter(|r| r.length >= required)
            .min_by_key(|r| r.length)
            .copied()
    }
}

impl PlacementStrategy for WorstFit {
    fn name(&self) -> &'static str {
        "worst_fit"
    }

    fn select(&self, runs: &[Sequence], required: BlockCount) -> Option<Sequence> {
        runs.iter()
            .filter(|r| r.length >= required)
            .max_by(|a, b| a.length.cmp(&b.length).then(b.start.cmp(&a.start)))
            .copied()
    }
}

static FIRST_FIT: FirstFit = FirstFit;
static BEST_FIT: BestFit = BestFit;
static WORST_FIT: WorstFit = WorstFit;

/// Placement strategy for a contiguous policy, `None` for paged ones
pub fn strategy_for(policy: ScalingPolicy) -> Option<&'static dyn PlacementStrategy> {
    match policy {
        ScalingPolicy::FirstFit => Some(&FIRST_FIT),
        ScalingPolicy::BestFit => Some(&BEST_FIT),
        ScalingPolicy::WorstFit => Some(&WORST_FIT),
        ScalingPolicy::Fifo | ScalingPolicy::Lru | ScalingPolicy::Nru => None,
    }
}

/// Place `required` contiguous blocks for `pid` in `store`
///
/// Returns the assigned indices in ascending order. The store is untouched on
/// error.
pub fn place_contiguous(
    store: &mut BlockStore,
    strategy: &dyn PlacementStrategy,
    pid: Pid,
    required: BlockCount,
) -> MemoryResult<Vec<BlockIndex>> {
    let runs = store.free_runs();

    let Some(run) = strategy.select(&runs, required) else {
        let free = store.free_count();
        let largest_run = runs.iter().map(|r| r.length).max().unwrap_or(0);
        debug!(
            "{}: no run of {} blocks for PID {} ({} free, largest run {})",
            strategy.name(),
            required,
            pid,
            free,
            largest_run
        );
        return Err(if free < required {
            MemoryError::InsufficientCapacity {
                requested: required,
                physical_free: free,
                swap_free: 0,
            }
        } else {
            MemoryError::Fragmented {
                requested: required,
                free,
                largest_run,
            }
        });
    };

    let indices: Vec<BlockIndex> = run.head(required).collect();
    for &index in &indices {
        store.assign(index, pid)?;
    }

    info!(
        "{}: placed PID {} in blocks {}..{} (run of {} at {})",
        strategy.name(),
        pid,
        run.start,
        run.start + required,
        run.length,
        run.start
    );
    Ok(indices)
}
