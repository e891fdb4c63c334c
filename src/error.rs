//! Unified error type for orderlock.
//!
//! Internal layers raise [`orderlock_core::Error`]; this module presents a
//! stable interface to callers. Conflicts are normally absorbed by the retry
//! loop and only surface from single-attempt calls.

use orderlock_core::{ExhaustionCause, ResourceKey};
use thiserror::Error;

/// All orderlock errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Row does not exist
    #[error("not found: {0}")]
    NotFound(ResourceKey),

    /// Coupon exhausted, stock exhausted or not enough points
    #[error("insufficient {key}: requested {requested}, available {available}")]
    InsufficientResource {
        /// Row that could not cover the debit
        key: ResourceKey,
        /// Amount asked for
        requested: u64,
        /// Amount held
        available: u64,
    },

    /// Another transaction committed first (or holds the row's lock)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The retry loop stopped without success
    #[error("retry exhausted after {attempts} attempt(s): {cause}")]
    RetryExhausted {
        /// Attempts made
        attempts: u32,
        /// Bound that stopped the loop
        cause: ExhaustionCause,
    },

    /// A named lock was not acquired in time
    #[error("timed out after {waited_ms}ms waiting for lock {name}")]
    LockTimeout {
        /// Lock name
        name: String,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// Rejected input (amounts, configuration values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for orderlock operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this is a domain rejection (missing row or insufficient resource).
    pub fn is_business(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::InsufficientResource { .. })
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is an insufficient-resource error.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Error::InsufficientResource { .. })
    }

    /// Check if the retry loop gave up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::RetryExhausted { .. })
    }
}

// Convert from internal core errors
impl From<orderlock_core::Error> for Error {
    fn from(e: orderlock_core::Error) -> Self {
        use orderlock_core::Error as CoreError;
        match e {
            CoreError::NotFound { key } => Error::NotFound(key),
            CoreError::InsufficientResource {
                key,
                requested,
                available,
            } => Error::InsufficientResource {
                key,
                requested,
                available,
            },
            e @ (CoreError::Conflict { .. } | CoreError::RowLocked { .. }) => {
                Error::Conflict(e.to_string())
            }
            CoreError::RetryExhausted { attempts, cause } => {
                Error::RetryExhausted { attempts, cause }
            }
            CoreError::LockTimeout { name, waited_ms } => Error::LockTimeout { name, waited_ms },
            CoreError::InvalidInput(msg) => Error::InvalidInput(msg),
            CoreError::InvalidState(msg) => Error::Internal(format!("invalid state: {}", msg)),
            CoreError::Internal(msg) => Error::Internal(msg),
        }
    }
}

// Convert from TOML parse errors
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
