//! Identifier types for the order domain
//!
//! This module defines the fundamental types used throughout the system:
//! - [`CouponId`], [`ProductId`], [`UserId`], [`OrderId`]: typed row identifiers
//! - [`ResourceKind`]: which debited counter (or catalog entry) a row holds
//! - [`ResourceKey`]: the store-wide address of one resource row

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                $name(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a promotional coupon row
    CouponId
);
define_id!(
    /// Identifier of a product; also addresses the product's stock row
    ProductId
);
define_id!(
    /// Identifier of a buyer; also addresses the buyer's loyalty-point row
    UserId
);
define_id!(
    /// Identifier assigned to an order record when it is appended
    OrderId
);

/// The kind of counter a resource row holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Promotional coupon count
    Coupon,
    /// Product stock count
    Stock,
    /// Buyer loyalty-point balance
    UserPoint,
    /// Catalog entry of a product (name and price)
    Product,
}

impl ResourceKind {
    /// Stable lowercase name, used in keys and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Coupon => "coupon",
            ResourceKind::Stock => "stock",
            ResourceKind::UserPoint => "user_point",
            ResourceKind::Product => "product",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one resource row in a store
///
/// Keys order by kind first, then id. Transactions acquire exclusive locks
/// in the order coupon → stock → point, which matches this ordering.
///
/// # Examples
///
/// ```
/// use orderlock_core::types::{CouponId, ResourceKey, ResourceKind};
///
/// let key = ResourceKey::coupon(CouponId(7));
/// assert_eq!(key.kind, ResourceKind::Coupon);
/// assert_eq!(key.to_string(), "coupon:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Counter kind
    pub kind: ResourceKind,
    /// Row id within the kind
    pub id: u64,
}

impl ResourceKey {
    /// Create a key from its parts
    pub fn new(kind: ResourceKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Key of a coupon row
    pub fn coupon(id: CouponId) -> Self {
        Self::new(ResourceKind::Coupon, id.0)
    }

    /// Key of a product's stock row
    pub fn stock(product_id: ProductId) -> Self {
        Self::new(ResourceKind::Stock, product_id.0)
    }

    /// Key of a buyer's point row
    pub fn user_point(user_id: UserId) -> Self {
        Self::new(ResourceKind::UserPoint, user_id.0)
    }

    /// Key of a product's catalog row
    pub fn product(product_id: ProductId) -> Self {
        Self::new(ResourceKind::Product, product_id.0)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
