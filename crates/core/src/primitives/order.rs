//! Order requests and records

use crate::error::{Error, Result};
use crate::types::{CouponId, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// What one order debits
///
/// The coupon always loses one redemption; stock loses `quantity` units and
/// the buyer's balance loses `points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Buyer
    pub user_id: UserId,
    /// Product bought
    pub product_id: ProductId,
    /// Coupon redeemed
    pub coupon_id: CouponId,
    /// Stock units to debit
    pub quantity: u64,
    /// Points to debit
    pub points: u64,
}

impl OrderRequest {
    /// Create a request
    ///
    /// # Errors
    /// `InvalidInput` if `quantity` is zero.
    pub fn new(
        user_id: UserId,
        product_id: ProductId,
        coupon_id: CouponId,
        quantity: u64,
        points: u64,
    ) -> Result<Self> {
        if quantity == 0 {
            return Err(Error::InvalidInput(
                "order quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            user_id,
            product_id,
            coupon_id,
            quantity,
            points,
        })
    }

    /// The record this request produces once committed
    pub fn to_new_order(&self) -> NewOrder {
        NewOrder {
            user_id: self.user_id,
            product_id: self.product_id,
            coupon_id: self.coupon_id,
        }
    }
}

/// An order staged for append, before the store assigns its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Buyer
    pub user_id: UserId,
    /// Product bought
    pub product_id: ProductId,
    /// Coupon redeemed
    pub coupon_id: CouponId,
}

impl NewOrder {
    /// Materialize with the id and timestamp chosen by the store
    pub fn into_record(self, id: OrderId, placed_at: i64) -> OrderRecord {
        OrderRecord {
            id,
            user_id: self.user_id,
            product_id: self.product_id,
            coupon_id: self.coupon_id,
            placed_at,
        }
    }
}

/// Immutable fact of a committed order
///
/// Exactly one record exists per committed order transaction. Records are
/// append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Id assigned on append
    pub id: OrderId,
    /// Buyer
    pub user_id: UserId,
    /// Product bought
    pub product_id: ProductId,
    /// Coupon redeemed
    pub coupon_id: CouponId,
    /// Commit timestamp (milliseconds since epoch)
    pub placed_at: i64,
}
