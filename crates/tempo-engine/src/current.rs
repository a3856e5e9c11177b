//! Process-wide handle to the active engine
//!
//! UI callbacks need to reach the running clock without threading a handle
//! through every call site. Rather than ad hoc global mutable state, the
//! active engine lives behind one explicitly managed slot: `install` on game
//! start, `clear` on reset/unmount. The engine itself stays single-threaded;
//! the mutex is the host-side serialization the engine contract requires.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::engine::TimerEngine;

/// Cloneable, mutex-guarded handle to one engine instance.
#[derive(Clone)]
pub struct SharedEngine(Arc<Mutex<TimerEngine>>);

impl SharedEngine {
    pub fn new(engine: TimerEngine) -> Self {
        SharedEngine(Arc::new(Mutex::new(engine)))
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut TimerEngine) -> R) -> R {
        f(&mut self.0.lock())
    }

    /// Lock the engine directly for multi-call sequences.
    pub fn lock(&self) -> MutexGuard<'_, TimerEngine> {
        self.0.lock()
    }
}

static CURRENT: Mutex<Option<SharedEngine>> = Mutex::new(None);

/// Install `engine` as the process-wide current engine, replacing any
/// previous one, and return its handle.
pub fn install(engine: TimerEngine) -> SharedEngine {
    let shared = SharedEngine::new(engine);
    *CURRENT.lock() = Some(shared.clone());
    shared
}

/// Handle to the current engine, if one is installed.
pub fn get() -> Option<SharedEngine> {
    CURRENT.lock().clone()
}

/// Tear down the current-engine slot. Existing handles stay valid.
pub fn clear() {
    CURRENT.lock().take();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempo_core::{build_config, Side, TimerMode};

    // One test exercises the whole install/get/clear lifecycle so parallel
    // test threads never race on the global slot.
    #[test]
    fn test_current_engine_lifecycle() {
        clear();
        assert!(get().is_none());

        let cfg = build_config(TimerMode::SuddenDeath, 5, None).unwrap();
        let handle = install(TimerEngine::new(cfg).unwrap());

        let t0 = Instant::now();
        handle.with(|e| e.start(t0)).unwrap();

        // A freshly fetched handle observes the same instance.
        let other = get().expect("engine installed");
        assert!(other.with(|e| e.is_running()));
        assert_eq!(other.with(|e| e.active_side()), Some(Side::White));

        clear();
        assert!(get().is_none());
        // The original handle outlives the slot.
        assert!(handle.with(|e| e.is_running()));
    }
}
