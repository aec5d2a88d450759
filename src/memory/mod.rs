/*!
 * Memory Module
 * Block stores, allocation policies, migration and the engine tying them together
 */

mod clock;
mod engine;
mod lifecycle;
mod migrator;
mod order;
mod placement;
mod replacement;
mod shared;
mod state;
mod store;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use clock::ClockInterrupt;
pub use engine::{
    EngineSnapshot, MemoryEngine, PendingAllocation, PolicyChange, Request, Response,
};
pub use lifecycle::ProcessRegistry;
pub use order::AllocationOrder;
pub use placement::{place_contiguous, strategy_for, BestFit, FirstFit, WorstFit};
pub use replacement::{policy_for, FifoReplacement, LruReplacement, NruReplacement};
pub use shared::SharedEngine;
pub use store::{scan_free_runs, BlockStore};
pub use traits::*;
pub use types::*;
