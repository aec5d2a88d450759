/*!
 * Request Dispatch
 * Serializable request surface over the engine operations
 */

use super::{EngineSnapshot, MemoryEngine, PolicyChange};
use crate::core::limits::pages_to_blocks;
use crate::core::types::{BlockCount, Pid};
use crate::memory::traits::ProcessLifecycle;
use crate::memory::types::{
    AccessKind, AllocationOutcome, MemoryError, MemoryResult, MemoryStats, MigrationOutcome,
    ProcessRef, ReleaseOutcome, ScalingPolicy,
};
use crate::monitoring::span_request;
use serde::{Deserialize, Serialize};

/// One engine request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Allocate {
        pid: Pid,
        blocks: BlockCount,
        #[serde(default)]
        modified: bool,
    },
    /// Allocation sized in pages of five blocks
    AllocatePages { pid: Pid, pages: usize },
    Release { pid: Pid },
    ReleaseFinished { pid: Pid },
    BringToPhysical { pid: Pid },
    Access { pid: Pid, kind: AccessKind },
    ClearReferenceBits,
    SetPolicy { policy: ScalingPolicy },
    Reset,
    Snapshot,
    Stats,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Allocate { .. } => "allocate",
            Request::AllocatePages { .. } => "allocate_pages",
            Request::Release { .. } => "release",
            Request::ReleaseFinished { .. } => "release_finished",
            Request::BringToPhysical { .. } => "bring_to_physical",
            Request::Access { .. } => "access",
            Request::ClearReferenceBits => "clear_reference_bits",
            Request::SetPolicy { .. } => "set_policy",
            Request::Reset => "reset",
            Request::Snapshot => "snapshot",
            Request::Stats => "stats",
        }
    }

    pub fn pid(&self) -> Option<Pid> {
        match self {
            Request::Allocate { pid, .. }
            | Request::AllocatePages { pid, .. }
            | Request::Release { pid }
            | Request::ReleaseFinished { pid }
            | Request::BringToPhysical { pid }
            | Request::Access { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}

/// Result of a successful request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Response {
    Allocated(AllocationOutcome),
    Released(ReleaseOutcome),
    Migrated(MigrationOutcome),
    ReferenceBitsCleared { cleared: usize },
    PolicyChanged(PolicyChange),
    Reset,
    Snapshot(Box<EngineSnapshot>),
    Stats(MemoryStats),
}

impl MemoryEngine {
    /// Apply one request
    ///
    /// Failures leave the engine exactly as it was, apart from the pending
    /// allocation a failed allocation records.
    pub fn handle(
        &mut self,
        request: Request,
        lifecycle: &mut dyn ProcessLifecycle,
    ) -> MemoryResult<Response> {
        let span = span_request(request.name(), request.pid());
        let _entered = span.enter();

        let result = match request {
            Request::Allocate {
                pid,
                blocks,
                modified,
            } => {
                let process = ProcessRef::new(pid, self.clock).with_modified(modified);
                self.allocate(process, blocks).map(Response::Allocated)
            }
            Request::AllocatePages { pid, pages } => match pages_to_blocks(pages) {
                Some(blocks) => self
                    .allocate(ProcessRef::new(pid, self.clock), blocks)
                    .map(Response::Allocated),
                None => Err(MemoryError::InvalidRequest(format!(
                    "{} pages overflow the block count",
                    pages
                ))),
            },
            Request::Release { pid } => Ok(Response::Released(self.release(pid))),
            Request::ReleaseFinished { pid } => {
                Ok(Response::Released(self.release_finished(pid, lifecycle)))
            }
            Request::BringToPhysical { pid } => {
                self.bring_to_physical(pid).map(Response::Migrated)
            }
            Request::Access { pid, kind } => self.access(pid, kind).map(Response::Migrated),
            Request::ClearReferenceBits => Ok(Response::ReferenceBitsCleared {
                cleared: self.clear_reference_bits(),
            }),
            Request::SetPolicy { policy } => {
                Ok(Response::PolicyChanged(self.set_policy(policy, lifecycle)))
            }
            Request::Reset => {
                self.reset();
                Ok(Response::Reset)
            }
            Request::Snapshot => Ok(Response::Snapshot(Box::new(self.snapshot()))),
            Request::Stats => Ok(Response::Stats(self.stats())),
        };

        match &result {
            Ok(_) => span.record_result(true),
            Err(err) => span.record_error(&err.to_string()),
        }
        result
    }
}
