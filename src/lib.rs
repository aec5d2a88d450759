/*!
 * Block Memory Simulation Kernel
 * Physical/swap block allocation with contiguous and paged policies
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::{ConfigError, EngineConfig, MemoryError, MemoryResult};
pub use memory::{
    AccessKind, EngineSnapshot, MemoryEngine, MemoryStats, ProcessLifecycle, ProcessRef,
    ProcessRegistry, Request, Response, ScalingPolicy, SharedEngine,
};
pub use monitoring::init_tracing;
