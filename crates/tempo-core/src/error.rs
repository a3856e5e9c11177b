//! Error types for the tempo clock

use thiserror::Error;

/// Clock errors
#[derive(Error, Debug)]
pub enum ClockError {
    // Config errors
    #[error("invalid duration: {minutes} minutes (allowed range 1..={max} minutes)")]
    InvalidDuration { minutes: u64, max: u64 },

    #[error("config mismatch: {0}")]
    ConfigMismatch(String),

    // Engine errors
    #[error("invalid transition: {op} while {state}")]
    InvalidTransition {
        op: &'static str,
        state: &'static str,
    },
}

/// Result type for clock operations
pub type ClockResult<T> = Result<T, ClockError>;
