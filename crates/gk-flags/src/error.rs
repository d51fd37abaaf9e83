//! Error types for the flag store.

use gk_core::{GkError, ValueKind};
use thiserror::Error;

use crate::flag::FlagKind;

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Errors that can occur when defining or writing flags.
#[derive(Debug, Error)]
pub enum FlagError {
    /// No flag with this key is defined.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    /// A flag with this key is already defined.
    #[error("flag already defined: {0}")]
    DuplicateFlag(String),

    /// The value does not fit the flag's kind.
    #[error("flag {key} holds {expected} values, got {found}")]
    KindMismatch {
        /// Flag key.
        key: String,
        /// The flag's kind.
        expected: FlagKind,
        /// The kind that was supplied.
        found: ValueKind,
    },

    /// An int flag was defined with `min > max`.
    #[error("flag {key} has invalid bounds {min}..={max}")]
    InvalidBounds {
        /// Flag key.
        key: String,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// Notifying observers failed.
    #[error("event dispatch failed: {0}")]
    Events(#[from] GkError),
}
