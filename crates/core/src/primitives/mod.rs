//! Resource and record types for the order domain
//!
//! This module defines the canonical data structures debited by an order.
//! These types are shared between the `storage` and `concurrency` crates.
//!
//! ## Design Principle
//!
//! - **orderlock-core** defines the entities and their local invariants (this module)
//! - **orderlock-storage** owns rows and stamps versions on commit
//! - **orderlock-concurrency** decides how each row is obtained and committed
//!
//! A resource's `decrease`/`use_points` only guards the counter it was handed.
//! Whether that counter was current is decided by how the row was obtained
//! (exclusive lock or versioned snapshot) and how it is committed.

pub mod coupon;
pub mod order;
pub mod point;
pub mod product;
pub mod resource;
pub mod stock;

// Re-export all types at module level
pub use coupon::Coupon;
pub use order::{NewOrder, OrderRecord, OrderRequest};
pub use point::UserPoint;
pub use product::Product;
pub use resource::{Resource, VersionedResource};
pub use stock::Stock;
