//! Storage layer for orderlock
//!
//! This crate implements the in-memory [`ResourceStore`](orderlock_core::ResourceStore):
//! - ShardedStore: DashMap-backed rows with per-row version stamps
//! - RowLock: FIFO exclusive row locks, released when the guard drops
//! - Gated batch commit: compare-and-swap validation and apply under one gate
//! - Append-only order log with a per-buyer index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod row_lock;
pub mod sharded;

pub use row_lock::{RowLock, RowLockGuard};
pub use sharded::{ShardedStore, StoreSnapshot};
