/*!
 * System Limits and Constants
 *
 * Centralized location for simulation-wide limits and thresholds.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// BLOCK STORE LIMITS
// =============================================================================

/// Physical store size (120 blocks)
/// Matches the grid the simulator was designed around: 24 rows of 5 blocks
pub const DEFAULT_PHYSICAL_BLOCKS: usize = 120;

/// Swap store size, equal to physical by default
pub const DEFAULT_SWAP_BLOCKS: usize = DEFAULT_PHYSICAL_BLOCKS;

/// Blocks that make up one page in paged mode
pub const BLOCKS_PER_PAGE: usize = 5;

/// Upper bound accepted for a configured store size
pub const MAX_STORE_BLOCKS: usize = 1 << 20;

// =============================================================================
// MEMORY PRESSURE
// =============================================================================

/// Usage ratio reported as medium pressure
pub const PRESSURE_MEDIUM_THRESHOLD: f64 = 0.60;

/// Usage ratio reported as high pressure (warns)
pub const PRESSURE_HIGH_THRESHOLD: f64 = 0.80;

/// Usage ratio reported as critical pressure
pub const PRESSURE_CRITICAL_THRESHOLD: f64 = 0.95;

// =============================================================================
// CLOCK INTERRUPT
// =============================================================================

/// Interval between NRU reference-bit clears
pub const DEFAULT_CLOCK_INTERRUPT_INTERVAL: Duration = Duration::from_secs(15);

// =============================================================================
// SERIALIZATION / TRACING
// =============================================================================

/// JSON SIMD threshold (1KB)
/// [PERF] Use simd_json for payloads >1KB, serde_json for smaller
pub const JSON_SIMD_THRESHOLD: usize = 1024;

/// Engine requests slower than this are logged as slow
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_millis(10);

/// Convert a page count to the block count it occupies
///
/// `None` when the block count does not fit in `usize`.
#[inline]
pub const fn pages_to_blocks(pages: usize) -> Option<usize> {
    pages.checked_mul(BLOCKS_PER_PAGE)
}

/// Check if JSON payload should use SIMD parsing
#[inline]
pub const fn should_use_json_simd(size: usize) -> bool {
    size > JSON_SIMD_THRESHOLD
}
