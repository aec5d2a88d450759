/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Slot index inside a block store
pub type BlockIndex = usize;

/// Logical timestamp (engine ticks, monotonically increasing)
pub type Timestamp = u64;

/// Number of blocks in a request or a store
pub type BlockCount = usize;
