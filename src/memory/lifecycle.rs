/*!
 * Process Registry
 * Minimal in-memory process lifecycle for hosts without their own scheduler
 */

use super::traits::ProcessLifecycle;
use crate::core::types::Pid;
use ahash::AHashSet;
use log::info;

/// Tracks which processes finished and how often a stop-all was requested
#[derive(Debug, Default, Clone)]
pub struct ProcessRegistry {
    finished: AHashSet<Pid>,
    stop_requests: usize,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&mut self, pid: Pid) {
        self.finished.insert(pid);
    }

    /// Forget a finished process once its memory has been reclaimed
    pub fn forget(&mut self, pid: Pid) -> bool {
        self.finished.remove(&pid)
    }

    pub fn stop_requests(&self) -> usize {
        self.stop_requests
    }
}

impl ProcessLifecycle for ProcessRegistry {
    fn is_finished(&self, pid: Pid) -> bool {
        self.finished.contains(&pid)
    }

    fn stop_all(&mut self) {
        self.stop_requests += 1;
        info!("Stop requested for all processes ({} so far)", self.stop_requests);
    }
}
