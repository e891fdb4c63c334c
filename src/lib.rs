//! # orderlock
//!
//! Concurrency-controlled order placement.
//!
//! An order debits three independent counters in one all-or-nothing unit: a
//! promotional coupon, a product's stock and the buyer's loyalty points. Many
//! buyers race for the same scarce coupon and stock rows, so each counter is
//! obtained under a per-resource lock mode:
//!
//! - **Optimistic**: read the row and its version, commit only if the version is unchanged
//! - **Pessimistic**: take the row's exclusive lock before reading
//!
//! A [`LockStrategy`] picks a mode per resource; the presets are
//! `optimistic`, `pessimistic` and `hybrid` (coupon and stock pessimistic,
//! points optimistic). Conflicting attempts are retried by a bounded retry
//! loop; business rejections never are.
//!
//! ## Quick Start
//!
//! ```ignore
//! use orderlock::prelude::*;
//!
//! let service = OrderService::in_memory()?;
//! service.store().insert(Coupon::new(CouponId(1), "launch", 100));
//! service.store().insert(Stock::new(ProductId(1), 100));
//! service.store().insert(Product::new(ProductId(1), "limited sneakers", 100_000));
//! service.store().insert(UserPoint::new(UserId(7), 10_000));
//!
//! let order = service.place_order(UserId(7), ProductId(1), CouponId(1), LockStrategy::hybrid())?;
//!
//! // Stock and point operations outside an order
//! let left = service.stock.quantity(ProductId(1))?;
//! let product = service.products.get(ProductId(1))?;
//! service.points.charge(UserId(7), 500, LockMode::Optimistic)?;
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod service;
mod services;
mod types;

pub mod prelude;

// Re-export main entry points
pub use config::OrderConfig;
pub use error::{Error, Result};
pub use service::{OrderService, OrderServiceBuilder};

// Re-export single-resource services
pub use services::{PointService, ProductService, StockService};

// Re-export types
pub use types::*;
