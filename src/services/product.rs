//! Product catalog reads through a short-lived look-aside cache.
//!
//! `get` serves a product from the cache while it is fresh and otherwise
//! loads the catalog row and caches it for `product_cache_ttl_ms`. The TTL is
//! short so a stale catalog entry cannot linger; a price change made through
//! [`ProductService::update_price`] evicts the entry as soon as it commits.
//!
//! # Example
//!
//! ```ignore
//! use orderlock::prelude::*;
//!
//! let service = OrderService::in_memory()?;
//! service.store().insert(Product::new(ProductId(1), "limited sneakers", 100_000));
//!
//! let product = service.products.get(ProductId(1))?;
//! assert_eq!(product.price(), 100_000);
//! ```

use super::cache::LookAside;
use crate::error::Result;
use orderlock_concurrency::{LockMode, RetryingFacade, TransactionManager};
use orderlock_core::{Product, ProductId, ResourceKey, ResourceStore, VersionedResource};
use orderlock_storage::ShardedStore;
use std::sync::Arc;
use std::time::Duration;

/// Product catalog operations.
///
/// Access via `service.products`.
pub struct ProductService<S: ResourceStore = ShardedStore> {
    store: Arc<S>,
    manager: Arc<TransactionManager>,
    facade: RetryingFacade,
    cache: LookAside<ProductId, Product>,
}

impl<S: ResourceStore> ProductService<S> {
    pub(crate) fn new(
        store: Arc<S>,
        manager: Arc<TransactionManager>,
        facade: RetryingFacade,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            manager,
            facade,
            cache: LookAside::new("product", ttl),
        }
    }

    /// Product by id, served from the cache while fresh.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product has no catalog row.
    pub fn get(&self, product_id: ProductId) -> Result<Product> {
        self.cache.get_or_load(product_id, || {
            let row = self.store.load(ResourceKey::product(product_id))?;
            Ok(Product::from_resource(row)?)
        })
    }

    /// Cached product, if present and fresh.
    pub fn cached(&self, product_id: ProductId) -> Option<Product> {
        self.cache.get(&product_id)
    }

    /// Change the unit price and evict the cached entry.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `price` is zero
    /// - `NotFound` if the product has no catalog row
    /// - `RetryExhausted` if retries hit a bound
    pub fn update_price(&self, product_id: ProductId, price: u64) -> Result<Product> {
        let updated = self.facade.run(|_| {
            self.manager
                .attempt(self.store.as_ref(), |txn| {
                    let mut product: Product =
                        txn.read(ResourceKey::product(product_id), LockMode::Optimistic)?;
                    product.set_price(price)?;
                    txn.stage(product.clone())?;
                    Ok(product)
                })
                .map(|(product, _)| product)
        })?;

        self.cache.evict(product_id);
        Ok(updated)
    }
}
