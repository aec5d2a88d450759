/*!
 * Memory Types
 * Common types for block allocation, replacement and migration
 */

use crate::core::limits::{
    PRESSURE_CRITICAL_THRESHOLD, PRESSURE_HIGH_THRESHOLD, PRESSURE_MEDIUM_THRESHOLD,
};
use crate::core::types::{BlockCount, BlockIndex, Pid, Timestamp};
use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
///
/// Every variant is reported with the engine state left exactly as it was
/// before the failing call.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MemoryError {
    #[error("Insufficient memory: requested {requested} blocks, {physical_free} free in physical, {swap_free} free in swap")]
    #[diagnostic(
        code(memory::insufficient_capacity),
        help("Release finished processes or request fewer blocks.")
    )]
    InsufficientCapacity {
        requested: BlockCount,
        physical_free: BlockCount,
        swap_free: BlockCount,
    },

    #[error("Memory fragmented: requested {requested} contiguous blocks, {free} free but largest run is {largest_run}")]
    #[diagnostic(
        code(memory::fragmented),
        help("Enough blocks are free but not adjacent. Release a neighbouring process or switch to a paged policy.")
    )]
    Fragmented {
        requested: BlockCount,
        free: BlockCount,
        largest_run: BlockCount,
    },

    #[error("Swap exhausted: eviction needs {required} swap blocks, {available} available")]
    #[diagnostic(
        code(memory::swap_exhausted),
        help("Both stores are full. Release processes before allocating more pages.")
    )]
    SwapExhausted {
        required: BlockCount,
        available: BlockCount,
    },

    #[error("Process {0} is not resident where expected")]
    #[diagnostic(code(memory::not_resident))]
    NotResident(Pid),

    #[error("Invalid request: {0}")]
    #[diagnostic(code(memory::invalid_request))]
    InvalidRequest(String),

    #[error("Invalid snapshot: {0}")]
    #[diagnostic(
        code(memory::invalid_snapshot),
        help("The snapshot does not describe a consistent engine state and was not applied.")
    )]
    InvalidSnapshot(String),

    #[error("Snapshot encoding failed: {0}")]
    #[diagnostic(code(memory::serialization))]
    Serialization(String),
}

impl From<crate::core::json::JsonError> for MemoryError {
    fn from(err: crate::core::json::JsonError) -> Self {
        MemoryError::Serialization(err.to_string())
    }
}

impl From<crate::core::bincode::BincodeError> for MemoryError {
    fn from(err: crate::core::bincode::BincodeError) -> Self {
        MemoryError::Serialization(err.to_string())
    }
}

/// Which of the two block stores a slot lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Physical,
    Swap,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StoreKind::Physical => write!(f, "physical"),
            StoreKind::Swap => write!(f, "swap"),
        }
    }
}

/// Location of one block held by a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockLocation {
    pub store: StoreKind,
    pub index: BlockIndex,
}

impl BlockLocation {
    pub const fn physical(index: BlockIndex) -> Self {
        Self {
            store: StoreKind::Physical,
            index,
        }
    }

    pub const fn swap(index: BlockIndex) -> Self {
        Self {
            store: StoreKind::Swap,
            index,
        }
    }
}

/// One fixed-size block slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub index: BlockIndex,
    pub occupant: Option<Pid>,
}

impl Slot {
    pub const fn empty(index: BlockIndex) -> Self {
        Self {
            index,
            occupant: None,
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

/// A maximal run of contiguous free slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub start: BlockIndex,
    pub length: BlockCount,
}

impl Sequence {
    /// Indices of the first `count` slots of the run
    pub fn head(&self, count: BlockCount) -> std::ops::Range<BlockIndex> {
        self.start..self.start + count.min(self.length)
    }
}

/// NRU page class, the combined (referenced, modified) state of a process
///
/// Variants are ordered by eviction preference: lower classes go first.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PageClass {
    /// Class 0: not referenced, not modified
    #[default]
    Idle,
    /// Class 1: not referenced, modified
    Dirty,
    /// Class 2: referenced, not modified
    Referenced,
    /// Class 3: referenced and modified
    ReferencedDirty,
}

impl PageClass {
    pub const fn from_bits(referenced: bool, modified: bool) -> Self {
        match (referenced, modified) {
            (false, false) => PageClass::Idle,
            (false, true) => PageClass::Dirty,
            (true, false) => PageClass::Referenced,
            (true, true) => PageClass::ReferencedDirty,
        }
    }

    /// Class number, 0 through 3
    pub const fn rank(self) -> u8 {
        self as u8
    }

    pub const fn referenced(self) -> bool {
        matches!(self, PageClass::Referenced | PageClass::ReferencedDirty)
    }

    pub const fn modified(self) -> bool {
        matches!(self, PageClass::Dirty | PageClass::ReferencedDirty)
    }

    pub const fn with_referenced(self, referenced: bool) -> Self {
        Self::from_bits(referenced, self.modified())
    }

    pub const fn with_modified(self, modified: bool) -> Self {
        Self::from_bits(self.referenced(), modified)
    }
}

/// Memory-related view of a process
///
/// The process itself belongs to the host's lifecycle manager; the engine only
/// reads and writes these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRef {
    pub id: Pid,
    pub created_at: Timestamp,
    pub last_accessed: Timestamp,
    pub page_class: PageClass,
    pub in_swap: bool,
    pub blocks: Vec<BlockLocation>,
}

impl ProcessRef {
    pub fn new(id: Pid, created_at: Timestamp) -> Self {
        Self {
            id,
            created_at,
            last_accessed: created_at,
            page_class: PageClass::Idle,
            in_swap: false,
            blocks: Vec::new(),
        }
    }

    pub fn with_modified(mut self, modified: bool) -> Self {
        self.page_class = self.page_class.with_modified(modified);
        self
    }

    pub fn with_referenced(mut self, referenced: bool) -> Self {
        self.page_class = self.page_class.with_referenced(referenced);
        self
    }

    #[inline]
    pub fn referenced(&self) -> bool {
        self.page_class.referenced()
    }

    #[inline]
    pub fn modified(&self) -> bool {
        self.page_class.modified()
    }

    pub fn set_referenced(&mut self, referenced: bool) {
        self.page_class = self.page_class.with_referenced(referenced);
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.page_class = self.page_class.with_modified(modified);
    }

    /// Mark the process as just used at `now`
    pub fn touch(&mut self, now: Timestamp) {
        self.last_accessed = now;
        self.set_referenced(true);
    }

    pub fn physical_blocks(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.blocks_in(StoreKind::Physical)
    }

    pub fn swap_blocks(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.blocks_in(StoreKind::Swap)
    }

    fn blocks_in(&self, store: StoreKind) -> impl Iterator<Item = BlockIndex> + '_ {
        self.blocks
            .iter()
            .filter(move |b| b.store == store)
            .map(|b| b.index)
    }

    pub fn is_resident(&self) -> bool {
        self.blocks.iter().any(|b| b.store == StoreKind::Physical)
    }

    pub(crate) fn refresh_swap_flag(&mut self) {
        self.in_swap = self.blocks.iter().any(|b| b.store == StoreKind::Swap);
    }
}

/// Eviction policy used by paged allocation and swap-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    Fifo,
    Lru,
    Nru,
}

/// Block scaling policy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalingPolicy {
    #[default]
    FirstFit,
    BestFit,
    WorstFit,
    Fifo,
    Lru,
    Nru,
}

impl ScalingPolicy {
    pub const ALL: [ScalingPolicy; 6] = [
        ScalingPolicy::FirstFit,
        ScalingPolicy::BestFit,
        ScalingPolicy::WorstFit,
        ScalingPolicy::Fifo,
        ScalingPolicy::Lru,
        ScalingPolicy::Nru,
    ];

    /// Convert to string representation
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstFit => "first_fit",
            Self::BestFit => "best_fit",
            Self::WorstFit => "worst_fit",
            Self::Fifo => "fifo",
            Self::Lru => "lru",
            Self::Nru => "nru",
        }
    }

    /// Human-readable label shown next to the block grid
    pub const fn description(&self) -> &'static str {
        match self {
            Self::FirstFit => "Contiguous - First Fit",
            Self::BestFit => "Contiguous - Best Fit",
            Self::WorstFit => "Contiguous - Worst Fit",
            Self::Fifo => "Paging - FIFO",
            Self::Lru => "Paging - LRU",
            Self::Nru => "Paging - NRU",
        }
    }

    pub const fn is_contiguous(&self) -> bool {
        matches!(self, Self::FirstFit | Self::BestFit | Self::WorstFit)
    }

    pub const fn is_paging(&self) -> bool {
        !self.is_contiguous()
    }

    /// Eviction policy for paged modes; contiguous modes never evict
    pub const fn eviction(&self) -> Option<EvictionPolicy> {
        match self {
            Self::Fifo => Some(EvictionPolicy::Fifo),
            Self::Lru => Some(EvictionPolicy::Lru),
            Self::Nru => Some(EvictionPolicy::Nru),
            Self::FirstFit | Self::BestFit | Self::WorstFit => None,
        }
    }
}

impl std::fmt::Display for ScalingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScalingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first_fit" | "firstfit" | "first" => Ok(Self::FirstFit),
            "best_fit" | "bestfit" | "best" => Ok(Self::BestFit),
            "worst_fit" | "worstfit" | "worst" => Ok(Self::WorstFit),
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            "nru" => Ok(Self::Nru),
            _ => Err(format!(
                "Invalid policy '{}'. Valid: first_fit, best_fit, worst_fit, fifo, lru, nru",
                s
            )),
        }
    }
}

impl Serialize for ScalingPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScalingPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How a process touches its memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Read,
    Write,
}

/// Result of a successful allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub process: ProcessRef,
    /// Processes pushed to swap to make room
    pub evicted: Vec<Pid>,
    pub physical: Vec<Slot>,
    pub swap: Vec<Slot>,
}

impl AllocationOutcome {
    pub fn block_indices(&self) -> Vec<BlockIndex> {
        self.process.blocks.iter().map(|b| b.index).collect()
    }
}

/// Result of a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseOutcome {
    pub released: Vec<Pid>,
    pub freed_physical: BlockCount,
    pub freed_swap: BlockCount,
}

impl ReleaseOutcome {
    pub fn is_noop(&self) -> bool {
        self.freed_physical == 0 && self.freed_swap == 0
    }
}

/// Result of bringing swapped blocks back into physical memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    /// (swap index, physical index) pairs, in move order
    pub moved: Vec<(BlockIndex, BlockIndex)>,
    pub evicted: Vec<Pid>,
    pub process: Option<ProcessRef>,
}

/// Memory statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub physical_total: BlockCount,
    pub physical_used: BlockCount,
    pub swap_total: BlockCount,
    pub swap_used: BlockCount,
    pub resident_processes: usize,
    pub swapped_processes: usize,
    pub free_runs: usize,
    pub largest_free_run: BlockCount,
    pub usage_percentage: f64,
}

impl MemoryStats {
    pub fn memory_pressure(&self) -> MemoryPressure {
        MemoryPressure::from_ratio(self.usage_percentage / 100.0)
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= PRESSURE_CRITICAL_THRESHOLD {
            MemoryPressure::Critical
        } else if ratio >= PRESSURE_HIGH_THRESHOLD {
            MemoryPressure::High
        } else if ratio >= PRESSURE_MEDIUM_THRESHOLD {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
