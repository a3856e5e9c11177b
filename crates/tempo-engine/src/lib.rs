//! tempo engine - the real-time chess clock state machine
//!
//! This crate implements the clock engine:
//! - `TimerEngine`: per-side remaining time, timestamp-delta ticking, and
//!   the per-mode turn-switch adjustments
//! - `TimeoutNotifier`: exactly-once flag-fall notification
//! - `current`: the process-wide handle to the active engine
//! - `driver`: an optional tokio tick driver

pub mod current;
pub mod driver;
pub mod engine;
pub mod notifier;

pub use current::SharedEngine;
pub use driver::TickDriver;
pub use engine::*;
pub use notifier::*;
