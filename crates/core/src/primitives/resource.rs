//! Type-erased resource rows
//!
//! Stores hold [`Resource`] values; the orchestrator works with the typed
//! entities through [`VersionedResource`].

use crate::error::{Error, Result};
use crate::primitives::{Coupon, Product, Stock, UserPoint};
use crate::types::{ResourceKey, ResourceKind};
use serde::{Deserialize, Serialize};

/// One resource row as held by a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// Coupon row
    Coupon(Coupon),
    /// Stock row
    Stock(Stock),
    /// Point row
    UserPoint(UserPoint),
    /// Catalog row
    Product(Product),
}

impl Resource {
    /// Kind of counter this row holds
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Coupon(_) => ResourceKind::Coupon,
            Resource::Stock(_) => ResourceKind::Stock,
            Resource::UserPoint(_) => ResourceKind::UserPoint,
            Resource::Product(_) => ResourceKind::Product,
        }
    }

    /// Store address of this row
    pub fn key(&self) -> ResourceKey {
        match self {
            Resource::Coupon(c) => ResourceKey::coupon(c.id),
            Resource::Stock(s) => ResourceKey::stock(s.product_id),
            Resource::UserPoint(p) => ResourceKey::user_point(p.user_id),
            Resource::Product(p) => ResourceKey::product(p.id),
        }
    }

    /// Version this copy was read at
    pub fn version(&self) -> u64 {
        match self {
            Resource::Coupon(c) => c.version(),
            Resource::Stock(s) => s.version(),
            Resource::UserPoint(p) => p.version(),
            Resource::Product(p) => p.version(),
        }
    }

    /// Current counter value (remaining, quantity or balance); a catalog
    /// row reports its price
    pub fn level(&self) -> u64 {
        match self {
            Resource::Coupon(c) => c.remaining(),
            Resource::Stock(s) => s.quantity(),
            Resource::UserPoint(p) => p.balance(),
            Resource::Product(p) => p.price(),
        }
    }

    /// Return this row stamped with a committed version.
    ///
    /// Only storage backends call this, when a commit makes the row durable.
    pub fn stamp(mut self, version: u64) -> Self {
        match &mut self {
            Resource::Coupon(c) => c.set_version(version),
            Resource::Stock(s) => s.set_version(version),
            Resource::UserPoint(p) => p.set_version(version),
            Resource::Product(p) => p.set_version(version),
        }
        self
    }
}

/// A typed entity that lives in a store as a [`Resource`]
pub trait VersionedResource: Clone + Send + Sync + Sized + 'static {
    /// Kind every value of this type has
    const KIND: ResourceKind;

    /// Store address
    fn key(&self) -> ResourceKey;

    /// Version this copy was read at
    fn version(&self) -> u64;

    /// Narrow a row to this type
    ///
    /// # Errors
    /// `Internal` if the row holds a different kind.
    fn from_resource(resource: Resource) -> Result<Self>;

    /// Widen back into a row
    fn into_resource(self) -> Resource;
}

fn kind_mismatch(expected: ResourceKind, found: &Resource) -> Error {
    Error::Internal(format!(
        "expected {} row, found {} at {}",
        expected,
        found.kind(),
        found.key()
    ))
}

impl VersionedResource for Coupon {
    const KIND: ResourceKind = ResourceKind::Coupon;

    fn key(&self) -> ResourceKey {
        ResourceKey::coupon(self.id)
    }

    fn version(&self) -> u64 {
        Coupon::version(self)
    }

    fn from_resource(resource: Resource) -> Result<Self> {
        match resource {
            Resource::Coupon(c) => Ok(c),
            other => Err(kind_mismatch(Self::KIND, &other)),
        }
    }

    fn into_resource(self) -> Resource {
        Resource::Coupon(self)
    }
}

impl VersionedResource for Stock {
    const KIND: ResourceKind = ResourceKind::Stock;

    fn key(&self) -> ResourceKey {
        ResourceKey::stock(self.product_id)
    }

    fn version(&self) -> u64 {
        Stock::version(self)
    }

    fn from_resource(resource: Resource) -> Result<Self> {
        match resource {
            Resource::Stock(s) => Ok(s),
            other => Err(kind_mismatch(Self::KIND, &other)),
        }
    }

    fn into_resource(self) -> Resource {
        Resource::Stock(self)
    }
}

impl VersionedResource for UserPoint {
    const KIND: ResourceKind = ResourceKind::UserPoint;

    fn key(&self) -> ResourceKey {
        ResourceKey::user_point(self.user_id)
    }

    fn version(&self) -> u64 {
        UserPoint::version(self)
    }

    fn from_resource(resource: Resource) -> Result<Self> {
        match resource {
            Resource::UserPoint(p) => Ok(p),
            other => Err(kind_mismatch(Self::KIND, &other)),
        }
    }

    fn into_resource(self) -> Resource {
        Resource::UserPoint(self)
    }
}

impl VersionedResource for Product {
    const KIND: ResourceKind = ResourceKind::Product;

    fn key(&self) -> ResourceKey {
        ResourceKey::product(self.id)
    }

    fn version(&self) -> u64 {
        Product::version(self)
    }

    fn from_resource(resource: Resource) -> Result<Self> {
        match resource {
            Resource::Product(p) => Ok(p),
            other => Err(kind_mismatch(Self::KIND, &other)),
        }
    }

    fn into_resource(self) -> Resource {
        Resource::Product(self)
    }
}

impl From<Coupon> for Resource {
    fn from(c: Coupon) -> Self {
        Resource::Coupon(c)
    }
}

impl From<Stock> for Resource {
    fn from(s: Stock) -> Self {
        Resource::Stock(s)
    }
}

impl From<UserPoint> for Resource {
    fn from(p: UserPoint) -> Self {
        Resource::UserPoint(p)
    }
}

impl From<Product> for Resource {
    fn from(p: Product) -> Self {
        Resource::Product(p)
    }
}
