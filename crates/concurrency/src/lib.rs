//! Concurrency layer for orderlock
//!
//! This crate runs order attempts against any [`ResourceStore`]:
//! - LockStrategy: optimistic or pessimistic mode per resource leg
//! - TransactionContext: read/write tracking and the attempt state machine
//! - OrderTransaction: coupon, stock and point legs committed as one batch
//! - RetryingFacade: bounded retry of conflicting attempts
//! - NamedLocks: timed named mutexes for work outside a transaction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod named_lock;
pub mod order;
pub mod retry;
pub mod strategy;
pub mod transaction;

pub use manager::{TransactionManager, TransactionStats};
pub use named_lock::{NamedLockGuard, NamedLocks};
pub use order::{ExternalStep, OrderTransaction};
pub use retry::{CancellationToken, RetryConfig, RetryingFacade};
pub use strategy::{LockMode, LockStrategy, StrategyKind};
pub use transaction::{AttemptOutcome, TransactionContext, TransactionStatus};

// Re-export the store trait for convenience
pub use orderlock_core::ResourceStore;
