/*!
 * Shared Engine
 * Thread-safe handle that serializes requests to one engine
 */

use super::engine::{EngineSnapshot, MemoryEngine, Request, Response};
use super::traits::ProcessLifecycle;
use super::types::{MemoryResult, MemoryStats};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to an engine shared between threads
///
/// Requests are applied one at a time in lock order.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<MemoryEngine>>,
}

impl SharedEngine {
    pub fn new(engine: MemoryEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn handle(
        &self,
        request: Request,
        lifecycle: &mut dyn ProcessLifecycle,
    ) -> MemoryResult<Response> {
        self.inner.lock().handle(request, lifecycle)
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut MemoryEngine) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn stats(&self) -> MemoryStats {
        self.inner.lock().stats()
    }
}

impl From<MemoryEngine> for SharedEngine {
    fn from(engine: MemoryEngine) -> Self {
        Self::new(engine)
    }
}
