//! Error types for the order domain
//!
//! Errors fall into two families:
//!
//! | Family | Variants | Retry? |
//! |--------|----------|--------|
//! | Conflict | `Conflict`, `RowLocked` | yes, by the retrying facade only |
//! | Business | `NotFound`, `InsufficientResource` | never |
//!
//! Everything else (`RetryExhausted`, `LockTimeout`, `InvalidState`,
//! `InvalidInput`, `Internal`) is terminal as well.

use crate::types::ResourceKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a retry loop gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionCause {
    /// The configured attempt limit was reached
    MaxAttempts,
    /// The configured deadline passed
    Deadline,
    /// The caller cancelled the operation
    Cancelled,
}

impl fmt::Display for ExhaustionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionCause::MaxAttempts => f.write_str("attempt limit reached"),
            ExhaustionCause::Deadline => f.write_str("deadline passed"),
            ExhaustionCause::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// All errors raised by the order core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The addressed row does not exist
    #[error("not found: {key}")]
    NotFound {
        /// Missing row
        key: ResourceKey,
    },

    /// A debit would take a counter below zero
    #[error("insufficient {key}: requested {requested}, available {available}")]
    InsufficientResource {
        /// Row that could not cover the debit
        key: ResourceKey,
        /// Amount the debit asked for
        requested: u64,
        /// Amount the row held
        available: u64,
    },

    /// A conditional write found a newer version than the one read
    #[error("version conflict on {key}: expected {expected}, found {actual}")]
    Conflict {
        /// Row whose version moved
        key: ResourceKey,
        /// Version the transaction read
        expected: u64,
        /// Version found at commit
        actual: u64,
    },

    /// A conditional write targeted a row another transaction holds exclusively
    #[error("{key} is exclusively locked by another transaction")]
    RowLocked {
        /// Locked row
        key: ResourceKey,
    },

    /// A retry loop stopped without a successful attempt
    #[error("retry exhausted after {attempts} attempt(s): {cause}")]
    RetryExhausted {
        /// Attempts made, including the last one
        attempts: u32,
        /// Bound that stopped the loop
        cause: ExhaustionCause,
    },

    /// A named lock could not be acquired in time
    #[error("timed out after {waited_ms}ms waiting for lock {name}")]
    LockTimeout {
        /// Lock name
        name: String,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// Operation not allowed in the transaction's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller-supplied input rejected
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bug or broken invariant
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a not-found error
    pub fn not_found(key: ResourceKey) -> Self {
        Error::NotFound { key }
    }

    /// Check if this error is retryable.
    ///
    /// Only the conflict family is retryable: a fresh attempt reads fresh
    /// versions and may succeed.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. } | Error::RowLocked { .. })
    }

    /// Check if this is a domain rejection (missing row, exhausted counter).
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::InsufficientResource { .. }
        )
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this is an insufficient-resource error.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Error::InsufficientResource { .. })
    }
}
