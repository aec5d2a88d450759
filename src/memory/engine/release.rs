/*!
 * Release
 * Idempotent reclamation of process blocks
 */

use super::MemoryEngine;
use crate::core::types::Pid;
use crate::memory::traits::ProcessLifecycle;
use crate::memory::types::ReleaseOutcome;
use log::{debug, info};

impl MemoryEngine {
    /// Free every slot `pid` holds in both stores
    ///
    /// Never fails. Releasing an unknown or already released process is a
    /// no-op.
    pub fn release(&mut self, pid: Pid) -> ReleaseOutcome {
        let (freed_physical, freed_swap) = self.state.release(pid);

        if self.pending.as_ref().is_some_and(|p| p.process.id == pid) {
            self.pending = None;
        }

        let outcome = ReleaseOutcome {
            released: vec![pid],
            freed_physical,
            freed_swap,
        };

        if outcome.is_noop() {
            debug!("Release of PID {} freed nothing", pid);
        } else {
            info!(
                "Released PID {}: {} physical, {} swap blocks",
                pid, freed_physical, freed_swap
            );
        }
        outcome
    }

    /// Release `pid` plus every process the host reports as finished
    pub fn release_finished(
        &mut self,
        pid: Pid,
        lifecycle: &dyn ProcessLifecycle,
    ) -> ReleaseOutcome {
        let mut targets: Vec<Pid> = self
            .state
            .processes
            .keys()
            .copied()
            .filter(|&p| lifecycle.is_finished(p))
            .collect();
        targets.push(pid);
        targets.sort_unstable();
        targets.dedup();

        targets
            .into_iter()
            .fold(ReleaseOutcome::default(), |mut total, target| {
                let single = self.release(target);
                total.released.push(target);
                total.freed_physical += single.freed_physical;
                total.freed_swap += single.freed_swap;
                total
            })
    }
}
