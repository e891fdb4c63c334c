//! Stock-only operations and the stock quantity cache.
//!
//! Reads go through a look-aside cache: a hit returns the cached quantity, a
//! miss loads the row and caches it for the configured TTL. Every committed
//! debit evicts the product's entry after the commit. A read whose load was
//! already in flight when the eviction happened is answered but not cached,
//! so the pre-commit quantity never outlives the debit.
//!
//! # Example
//!
//! ```ignore
//! use orderlock::prelude::*;
//!
//! let service = OrderService::in_memory()?;
//! service.store().insert(Stock::new(ProductId(1), 100));
//!
//! assert_eq!(service.stock.quantity(ProductId(1))?, 100);
//! service.stock.decrease(ProductId(1), 3)?;
//! assert_eq!(service.stock.quantity(ProductId(1))?, 97);
//! ```

use super::cache::LookAside;
use crate::error::{Error, Result};
use orderlock_concurrency::{LockMode, NamedLocks, RetryingFacade, TransactionManager};
use orderlock_core::{ProductId, ResourceKey, ResourceStore, Stock, VersionedResource};
use orderlock_storage::ShardedStore;
use std::sync::Arc;
use std::time::Duration;

/// Stock operations.
///
/// Access via `service.stock`.
pub struct StockService<S: ResourceStore = ShardedStore> {
    store: Arc<S>,
    manager: Arc<TransactionManager>,
    facade: RetryingFacade,
    cache: LookAside<ProductId, u64>,
    named_locks: NamedLocks,
    lock_wait: Duration,
}

impl<S: ResourceStore> StockService<S> {
    pub(crate) fn new(
        store: Arc<S>,
        manager: Arc<TransactionManager>,
        facade: RetryingFacade,
        ttl: Duration,
        lock_wait: Duration,
    ) -> Self {
        Self {
            store,
            manager,
            facade,
            cache: LookAside::new("stock", ttl),
            named_locks: NamedLocks::new(),
            lock_wait,
        }
    }

    /// Name of the lock serializing debits of `product_id`.
    pub fn lock_name(product_id: ProductId) -> String {
        format!("lock:stock:{}", product_id)
    }

    /// Named locks used by [`decrease_with_named_lock`](Self::decrease_with_named_lock).
    pub fn named_locks(&self) -> &NamedLocks {
        &self.named_locks
    }

    /// Units on hand, served from the cache while fresh.
    pub fn quantity(&self, product_id: ProductId) -> Result<u64> {
        self.cache.get_or_load(product_id, || {
            let row = self.store.load(ResourceKey::stock(product_id))?;
            Ok(Stock::from_resource(row)?.quantity())
        })
    }

    /// Cached quantity, if present and fresh.
    pub fn cached(&self, product_id: ProductId) -> Option<u64> {
        self.cache.get(&product_id)
    }

    /// Remove `quantity` units. Returns the units left.
    ///
    /// Runs optimistically inside the retry loop.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `quantity` is zero
    /// - `InsufficientResource` if fewer units remain
    /// - `NotFound` if the product has no stock row
    /// - `RetryExhausted` if retries hit a bound
    pub fn decrease(&self, product_id: ProductId, quantity: u64) -> Result<u64> {
        if quantity == 0 {
            return Err(Error::InvalidInput(
                "stock decrease must be at least 1".to_string(),
            ));
        }

        let left = self.facade.run(|_| {
            self.manager
                .attempt(self.store.as_ref(), |txn| {
                    let mut stock: Stock =
                        txn.read(ResourceKey::stock(product_id), LockMode::Optimistic)?;
                    stock.decrease(quantity)?;
                    let left = stock.quantity();
                    txn.stage(stock)?;
                    Ok(left)
                })
                .map(|(left, _)| left)
        })?;

        self.evict(product_id);
        Ok(left)
    }

    /// Like [`decrease`](Self::decrease), serialized per product behind a
    /// named lock.
    ///
    /// # Errors
    ///
    /// `LockTimeout` if the lock is not acquired within the configured
    /// wait; nothing is debited in that case.
    pub fn decrease_with_named_lock(&self, product_id: ProductId, quantity: u64) -> Result<u64> {
        let name = Self::lock_name(product_id);
        let _guard = self.named_locks.try_lock_for(&name, self.lock_wait)?;
        self.decrease(product_id, quantity)
    }

    /// Drop the cached quantity of `product_id`.
    pub(crate) fn evict(&self, product_id: ProductId) {
        self.cache.evict(product_id);
    }
}
