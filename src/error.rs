//! Recoverable input errors reported by the engine.
//!
//! None of these leave the session half-updated: every check runs before
//! the first write.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Integer outside the 0-36 wheel range
    #[error("spin {value} is outside the wheel range 0-36")]
    InvalidSpin { value: i64 },

    /// Input that is not a whole number (e.g. "3.5", "abc")
    #[error("spin input {input:?} is not an integer")]
    NonIntegerSpin { input: String },

    /// Starting balance must be positive and finite
    #[error("starting balance {value} must be a positive finite number")]
    InvalidBalance { value: f64 },
}

pub type EngineResult<T> = Result<T, EngineError>;
