//! tempo test harness - scripted games over simulated time
//!
//! Drives a real `TimerEngine` through deterministic simulated time with a
//! jittered tick cadence, so scenario tests can assert exact remaining-time
//! values without sleeping.

pub mod simulator;

pub use simulator::*;
