//! Point-only operations.
//!
//! Spending and topping up a buyer's balance outside an order. The caller
//! picks the lock mode: pessimistic calls wait for the row's exclusive lock,
//! optimistic calls commit conditionally and are retried on conflict.
//!
//! # Example
//!
//! ```ignore
//! use orderlock::prelude::*;
//!
//! let service = OrderService::in_memory()?;
//! service.store().insert(UserPoint::new(UserId(1), 5_000));
//!
//! service.points.charge(UserId(1), 1_000, LockMode::Optimistic)?;
//! let left = service.points.use_points(UserId(1), 500, LockMode::Pessimistic)?;
//! assert_eq!(left, 5_500);
//! ```

use crate::error::Result;
use orderlock_concurrency::{LockMode, RetryingFacade, TransactionManager};
use orderlock_core::{ResourceKey, ResourceStore, UserId, UserPoint, VersionedResource};
use orderlock_storage::ShardedStore;
use std::sync::Arc;

/// Point balance operations.
///
/// Access via `service.points`.
pub struct PointService<S: ResourceStore = ShardedStore> {
    store: Arc<S>,
    manager: Arc<TransactionManager>,
    facade: RetryingFacade,
}

impl<S: ResourceStore> PointService<S> {
    pub(crate) fn new(store: Arc<S>, manager: Arc<TransactionManager>, facade: RetryingFacade) -> Self {
        Self {
            store,
            manager,
            facade,
        }
    }

    /// Current balance of `user_id`.
    pub fn balance(&self, user_id: UserId) -> Result<u64> {
        let row = self.store.load(ResourceKey::user_point(user_id))?;
        Ok(UserPoint::from_resource(row)?.balance())
    }

    /// Spend `amount` points. Returns the balance left.
    ///
    /// Spending zero still takes the row's lock in pessimistic mode but
    /// writes nothing, so the row's version does not change.
    ///
    /// # Errors
    ///
    /// - `InsufficientResource` if the balance is below `amount`
    /// - `NotFound` if the buyer has no point row
    /// - `RetryExhausted` if optimistic retries hit a bound
    pub fn use_points(&self, user_id: UserId, amount: u64, mode: LockMode) -> Result<u64> {
        self.apply(user_id, mode, |point| point.use_points(amount))
    }

    /// Top up by `amount` points. Returns the new balance.
    pub fn charge(&self, user_id: UserId, amount: u64, mode: LockMode) -> Result<u64> {
        self.apply(user_id, mode, |point| point.charge(amount))
    }

    fn apply<F>(&self, user_id: UserId, mode: LockMode, op: F) -> Result<u64>
    where
        F: Fn(&mut UserPoint) -> orderlock_core::Result<()>,
    {
        let attempt = |_: u32| {
            self.manager
                .attempt(self.store.as_ref(), |txn| {
                    let mut point: UserPoint = txn.read(ResourceKey::user_point(user_id), mode)?;
                    op(&mut point)?;
                    let balance = point.balance();
                    txn.stage(point)?;
                    Ok(balance)
                })
                .map(|(balance, _)| balance)
        };

        let balance = if mode.can_conflict() {
            self.facade.run(attempt)?
        } else {
            attempt(1)?
        };
        tracing::debug!(user_id = user_id.get(), balance, %mode, "point balance updated");
        Ok(balance)
    }
}
