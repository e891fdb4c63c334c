//! UserPoint: a buyer's loyalty-point balance

use crate::error::{Error, Result};
use crate::types::{ResourceKey, UserId};
use serde::{Deserialize, Serialize};

/// Loyalty-point balance of one buyer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoint {
    /// Owner (also the row id)
    pub user_id: UserId,
    balance: u64,
    version: u64,
}

impl UserPoint {
    /// Create a point row at version 0
    pub fn new(user_id: UserId, balance: u64) -> Self {
        Self {
            user_id,
            balance,
            version: 0,
        }
    }

    /// Points available
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Version this copy was read at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Spend `amount` points
    ///
    /// Spending zero is allowed and leaves the balance unchanged.
    ///
    /// # Errors
    /// `InsufficientResource` if the balance is below `amount`.
    pub fn use_points(&mut self, amount: u64) -> Result<()> {
        if self.balance < amount {
            return Err(Error::InsufficientResource {
                key: ResourceKey::user_point(self.user_id),
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Top up the balance by `amount` points
    ///
    /// # Errors
    /// `InvalidInput` if the balance would overflow.
    pub fn charge(&mut self, amount: u64) -> Result<()> {
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            Error::InvalidInput(format!(
                "charging {} points overflows balance of user {}",
                amount, self.user_id
            ))
        })?;
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
