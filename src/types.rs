//! Public types for the orderlock API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// Identifiers and addressing
pub use orderlock_core::{CouponId, OrderId, ProductId, ResourceKey, ResourceKind, UserId};

// Resource rows and orders
pub use orderlock_core::{
    Coupon, OrderRecord, OrderRequest, Product, Resource, Stock, UserPoint, VersionedResource,
};

// Retry exhaustion reasons
pub use orderlock_core::ExhaustionCause;

// Store boundary and the in-memory implementation
pub use orderlock_core::ResourceStore;
pub use orderlock_storage::{ShardedStore, StoreSnapshot};

// Strategies, retry policy and transaction statistics
pub use orderlock_concurrency::{
    CancellationToken, ExternalStep, LockMode, LockStrategy, NamedLocks, OrderTransaction,
    RetryConfig, RetryingFacade, StrategyKind, TransactionStats,
};
