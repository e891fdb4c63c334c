//! Stock: units of a product on hand

use crate::error::{Error, Result};
use crate::types::{ProductId, ResourceKey};
use serde::{Deserialize, Serialize};

/// Stock level of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Product this stock belongs to (also the row id)
    pub product_id: ProductId,
    quantity: u64,
    version: u64,
}

impl Stock {
    /// Create a stock row at version 0
    pub fn new(product_id: ProductId, quantity: u64) -> Self {
        Self {
            product_id,
            quantity,
            version: 0,
        }
    }

    /// Units on hand
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Version this copy was read at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Remove `amount` units
    ///
    /// # Errors
    /// `InsufficientResource` if fewer than `amount` units remain.
    pub fn decrease(&mut self, amount: u64) -> Result<()> {
        if self.quantity < amount {
            return Err(Error::InsufficientResource {
                key: ResourceKey::stock(self.product_id),
                requested: amount,
                available: self.quantity,
            });
        }
        self.quantity -= amount;
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
