//! Product: catalog entry read through the product cache

use crate::error::{Error, Result};
use crate::types::ProductId;
use serde::{Deserialize, Serialize};

/// Name and price of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id (also the row id; the stock row shares it)
    pub id: ProductId,
    /// Display name
    pub name: String,
    price: u64,
    version: u64,
}

impl Product {
    /// Create a catalog row at version 0
    pub fn new(id: ProductId, name: impl Into<String>, price: u64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            version: 0,
        }
    }

    /// Unit price
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Version this copy was read at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the unit price
    ///
    /// # Errors
    /// `InvalidInput` if `price` is zero.
    pub fn set_price(&mut self, price: u64) -> Result<()> {
        if price == 0 {
            return Err(Error::InvalidInput(format!(
                "price of product {} must be positive",
                self.id
            )));
        }
        self.price = price;
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
