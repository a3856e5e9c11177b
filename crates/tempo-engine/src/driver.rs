//! Periodic tick driver
//!
//! Hosts that already own a frame/interval loop can call
//! [`TimerEngine::tick`](crate::TimerEngine::tick) themselves; this driver is
//! for hosts that want the cadence handled. Accuracy does not depend on the
//! interval being honored exactly: the engine charges timestamp deltas, so a
//! late tick simply charges more at once.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::current::SharedEngine;

/// Default cadence; well under the 100ms resolution needed for timely
/// expiry detection and smooth display.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Background task ticking a [`SharedEngine`] at a fixed interval.
///
/// The task runs until stopped or dropped. Ticks while the engine is paused
/// or expired are no-ops, so the driver can outlive individual games.
pub struct TickDriver {
    task: JoinHandle<()>,
}

impl TickDriver {
    /// Spawn a driver on the current tokio runtime.
    pub fn spawn(engine: SharedEngine, interval: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                engine.with(|e| e.tick(Instant::now()));
            }
        });
        TickDriver { task }
    }

    /// Spawn with [`DEFAULT_TICK_INTERVAL`].
    pub fn spawn_default(engine: SharedEngine) -> Self {
        Self::spawn(engine, DEFAULT_TICK_INTERVAL)
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
