//! Core types for orderlock
//!
//! This crate defines the shared vocabulary of the order system:
//! - Typed ids and [`ResourceKey`] addressing
//! - Versioned resource entities: [`Coupon`], [`Stock`], [`UserPoint`], and the
//!   [`Product`] catalog row
//! - [`OrderRequest`] and the append-only [`OrderRecord`]
//! - The [`Error`] taxonomy (retryable conflicts vs terminal business errors)
//! - The [`ResourceStore`] boundary and its [`WriteBatch`] commit unit

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod primitives;
pub mod traits;
pub mod types;

pub use error::{Error, ExhaustionCause, Result};
pub use primitives::{
    Coupon, NewOrder, OrderRecord, OrderRequest, Product, Resource, Stock, UserPoint,
    VersionedResource,
};
pub use traits::{
    CommitReceipt, LockToken, ResourceStore, RowLockHandle, RowWrite, WriteBatch, WriteMode,
};
pub use types::{CouponId, OrderId, ProductId, ResourceKey, ResourceKind, UserId};
