//! Coupon: a finite count of promotional redemptions

use crate::error::{Error, Result};
use crate::types::{CouponId, ResourceKey};
use serde::{Deserialize, Serialize};

/// A promotional coupon with a remaining redemption count
///
/// Each coupon has:
/// - A remaining count that never goes below zero
/// - A version stamp, advanced only by the store on commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Row id
    pub id: CouponId,
    /// Display name
    pub name: String,
    remaining: u64,
    version: u64,
}

impl Coupon {
    /// Create a new coupon at version 0
    pub fn new(id: CouponId, name: impl Into<String>, remaining: u64) -> Self {
        Self {
            id,
            name: name.into(),
            remaining,
            version: 0,
        }
    }

    /// Redemptions left
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Version this copy was read at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Redeem one coupon
    ///
    /// # Errors
    /// `InsufficientResource` when nothing remains; the count is untouched.
    pub fn decrease(&mut self) -> Result<()> {
        if self.remaining == 0 {
            return Err(Error::InsufficientResource {
                key: ResourceKey::coupon(self.id),
                requested: 1,
                available: 0,
            });
        }
        self.remaining -= 1;
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
