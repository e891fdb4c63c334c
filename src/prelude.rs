//! Convenient imports for orderlock.
//!
//! ```ignore
//! use orderlock::prelude::*;
//!
//! let service = OrderService::in_memory()?;
//! service.place_order(UserId(1), ProductId(1), CouponId(1), LockStrategy::hybrid())?;
//! ```

// Main entry point
pub use crate::service::{OrderService, OrderServiceBuilder};
pub use crate::config::OrderConfig;

// Error handling
pub use crate::error::{Error, Result};

// Services
pub use crate::services::{PointService, ProductService, StockService};

// Core types
pub use crate::types::{
    Coupon, CouponId, OrderRecord, OrderRequest, Product, ProductId, ResourceKey, Stock, UserId,
    UserPoint,
};

// Strategies and retry
pub use crate::types::{CancellationToken, LockMode, LockStrategy, RetryConfig, StrategyKind};

// In-memory store
pub use crate::types::ShardedStore;
