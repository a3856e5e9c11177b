//! tempo core - fundamental chess clock types
//!
//! This crate defines the types shared across the clock engine:
//! - Sides and per-side storage (`Side`, `PerSide`)
//! - Time controls (`TimerMode`, `TimerConfig`, `StageBonus`)
//! - Custom overrides and the config builder
//! - The error taxonomy

pub mod config;
pub mod error;
pub mod side;

pub use config::*;
pub use error::*;
pub use side::*;
