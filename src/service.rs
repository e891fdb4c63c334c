//! Main entry point for orderlock.
//!
//! This module provides [`OrderService`], the primary entry point for placing
//! orders, and its builder.

use crate::config::OrderConfig;
use crate::error::Result;
use crate::services::{PointService, ProductService, StockService};
use orderlock_concurrency::{
    CancellationToken, ExternalStep, LockStrategy, OrderTransaction, RetryConfig, RetryingFacade,
    StrategyKind, TransactionManager, TransactionStats,
};
use orderlock_core::{CouponId, OrderRecord, OrderRequest, ProductId, ResourceStore, UserId};
use orderlock_storage::{ShardedStore, StoreSnapshot};
use std::sync::Arc;

/// The order service.
///
/// Places orders that debit one coupon, `quantity_per_order` stock units and
/// `points_per_order` points as a single unit, under a chosen
/// [`LockStrategy`]. Create one with [`OrderService::in_memory`] or
/// [`OrderService::builder`].
///
/// # Example
///
/// ```ignore
/// use orderlock::prelude::*;
///
/// let service = OrderService::in_memory()?;
/// service.store().insert(Coupon::new(CouponId(1), "launch", 100));
/// service.store().insert(Stock::new(ProductId(1), 100));
/// service.store().insert(UserPoint::new(UserId(1), 10_000));
///
/// let order = service.place_order(UserId(1), ProductId(1), CouponId(1), LockStrategy::hybrid())?;
/// println!("placed order {}", order.id);
/// ```
pub struct OrderService<S: ResourceStore = ShardedStore> {
    store: Arc<S>,
    config: OrderConfig,
    manager: Arc<TransactionManager>,
    facade: RetryingFacade,
    external_step: Option<Arc<dyn ExternalStep>>,

    /// Stock operations and the stock quantity cache
    pub stock: StockService<S>,

    /// Point balance operations
    pub points: PointService<S>,

    /// Product catalog reads and the product cache
    pub products: ProductService<S>,
}

impl OrderService<ShardedStore> {
    /// Create a builder for service configuration.
    pub fn builder() -> OrderServiceBuilder {
        OrderServiceBuilder::new()
    }

    /// Create a service over an empty in-memory store with default settings.
    pub fn in_memory() -> Result<Self> {
        Self::builder().build_in_memory()
    }

    /// Snapshot of every row and the order count at one commit boundary.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Every order placed so far, in placement order.
    pub fn orders(&self) -> Vec<OrderRecord> {
        self.store.orders()
    }

    /// Number of orders placed so far.
    pub fn order_count(&self) -> usize {
        self.store.order_count()
    }

    /// Orders placed by `user_id`.
    pub fn orders_for_user(&self, user_id: UserId) -> Vec<OrderRecord> {
        self.store.orders_for_user(user_id)
    }
}

impl<S: ResourceStore> OrderService<S> {
    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    /// Cancellation signal shared by every retry loop of this service.
    ///
    /// Cancelling is permanent: later retrying calls fail with
    /// `RetryExhausted` before their first attempt.
    pub fn cancellation(&self) -> &CancellationToken {
        self.facade.cancellation()
    }

    /// Attempt counters across orders, stock and point operations.
    pub fn stats(&self) -> TransactionStats {
        self.manager.stats()
    }

    /// Place an order under `strategy`.
    ///
    /// Strategies that can conflict run inside the retry loop; fully
    /// pessimistic orders run once, since they can only wait.
    ///
    /// # Errors
    ///
    /// - `InsufficientResource` if the coupon, stock or points run out
    /// - `NotFound` if a row is missing
    /// - `RetryExhausted` if conflicts outlast the retry bounds
    pub fn place_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
        coupon_id: CouponId,
        strategy: impl Into<LockStrategy>,
    ) -> Result<OrderRecord> {
        let request = self.request(user_id, product_id, coupon_id)?;
        self.place_request(&request, strategy.into())
    }

    /// Place an order under the configured default strategy.
    pub fn place(&self, user_id: UserId, product_id: ProductId, coupon_id: CouponId) -> Result<OrderRecord> {
        self.place_order(user_id, product_id, coupon_id, self.config.default_strategy)
    }

    /// Place an order described by `request`.
    pub fn place_request(&self, request: &OrderRequest, strategy: LockStrategy) -> Result<OrderRecord> {
        let txn = self.transaction(strategy);
        let record = if strategy.can_conflict() {
            self.facade.run(|_| txn.execute(self.store.as_ref(), request))?
        } else {
            txn.execute(self.store.as_ref(), request)?
        };
        self.stock.evict(request.product_id);
        Ok(record)
    }

    /// Run exactly one order attempt.
    ///
    /// Unlike [`place_order`](Self::place_order), a lost version race is
    /// returned as `Conflict` instead of being retried.
    pub fn try_place_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
        coupon_id: CouponId,
        strategy: impl Into<LockStrategy>,
    ) -> Result<OrderRecord> {
        let request = self.request(user_id, product_id, coupon_id)?;
        let record = self
            .transaction(strategy.into())
            .execute(self.store.as_ref(), &request)?;
        self.stock.evict(request.product_id);
        Ok(record)
    }

    /// Order transaction bound to this service's counters and external step.
    pub fn transaction(&self, strategy: LockStrategy) -> OrderTransaction {
        let txn = OrderTransaction::with_manager(strategy, Arc::clone(&self.manager));
        match &self.external_step {
            Some(step) => txn.with_shared_step(Arc::clone(step)),
            None => txn,
        }
    }

    fn request(&self, user_id: UserId, product_id: ProductId, coupon_id: CouponId) -> Result<OrderRequest> {
        Ok(OrderRequest::new(
            user_id,
            product_id,
            coupon_id,
            self.config.quantity_per_order,
            self.config.points_per_order,
        )?)
    }
}

impl<S: ResourceStore> std::fmt::Debug for OrderService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("config", &self.config)
            .field("external_step", &self.external_step.is_some())
            .field("stats", &self.manager.stats())
            .finish()
    }
}

/// Builder for service configuration.
///
/// # Example
///
/// ```ignore
/// // Fast retries, bounded attempts, all-optimistic by default
/// let service = OrderService::builder()
///     .retry_delay_ms(5)
///     .max_attempts(200)
///     .default_strategy(StrategyKind::Optimistic)
///     .build_in_memory()?;
///
/// // From a TOML document
/// let config = OrderConfig::from_toml_str(&std::fs::read_to_string("orderlock.toml")?)?;
/// let service = OrderService::builder().config(config).build(ShardedStore::new())?;
/// ```
#[derive(Default)]
pub struct OrderServiceBuilder {
    config: OrderConfig,
    external_step: Option<Arc<dyn ExternalStep>>,
    cancel: Option<CancellationToken>,
}

impl OrderServiceBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: OrderConfig) -> Self {
        self.config = config;
        self
    }

    /// Points debited by each order.
    pub fn points_per_order(mut self, points: u64) -> Self {
        self.config.points_per_order = points;
        self
    }

    /// Stock units debited by each order.
    pub fn quantity_per_order(mut self, quantity: u64) -> Self {
        self.config.quantity_per_order = quantity;
        self
    }

    /// Replace the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Fixed wait between conflicting attempts.
    pub fn retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.retry.delay_ms = delay_ms;
        self
    }

    /// Give up after `max_attempts` conflicting attempts.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = Some(max_attempts);
        self
    }

    /// Give up retrying once `timeout_ms` has passed.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.retry.timeout_ms = Some(timeout_ms);
        self
    }

    /// Strategy used by [`OrderService::place`].
    pub fn default_strategy(mut self, kind: StrategyKind) -> Self {
        self.config.default_strategy = kind;
        self
    }

    /// Freshness window of the stock quantity cache.
    pub fn stock_cache_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.config.stock_cache_ttl_ms = ttl_ms;
        self
    }

    /// Freshness window of the product cache.
    pub fn product_cache_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.config.product_cache_ttl_ms = ttl_ms;
        self
    }

    /// Named lock wait bound.
    pub fn named_lock_wait_ms(mut self, wait_ms: u64) -> Self {
        self.config.named_lock_wait_ms = wait_ms;
        self
    }

    /// Run `step` inside every order attempt, after the legs and before commit.
    pub fn external_step(mut self, step: impl ExternalStep + 'static) -> Self {
        self.external_step = Some(Arc::new(step));
        self
    }

    /// Use `cancel` to stop this service's retry loops.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build over a fresh in-memory store.
    pub fn build_in_memory(self) -> Result<OrderService<ShardedStore>> {
        self.build(ShardedStore::new())
    }

    /// Build over `store`.
    pub fn build<S: ResourceStore>(self, store: S) -> Result<OrderService<S>> {
        self.build_shared(Arc::new(store))
    }

    /// Build over a store shared with other owners.
    pub fn build_shared<S: ResourceStore>(self, store: Arc<S>) -> Result<OrderService<S>> {
        self.config.validate()?;

        let manager = Arc::new(TransactionManager::new());
        let mut facade = RetryingFacade::new(self.config.retry);
        if let Some(cancel) = self.cancel {
            facade = facade.with_cancellation(cancel);
        }

        tracing::info!(
            default_strategy = ?self.config.default_strategy,
            points_per_order = self.config.points_per_order,
            retry_delay_ms = self.config.retry.delay_ms,
            retry_timeout_ms = ?self.config.retry.timeout_ms,
            "order service ready"
        );

        Ok(OrderService {
            stock: StockService::new(
                Arc::clone(&store),
                Arc::clone(&manager),
                facade.clone(),
                self.config.stock_cache_ttl(),
                self.config.named_lock_wait(),
            ),
            points: PointService::new(Arc::clone(&store), Arc::clone(&manager), facade.clone()),
            products: ProductService::new(
                Arc::clone(&store),
                Arc::clone(&manager),
                facade.clone(),
                self.config.product_cache_ttl(),
            ),
            store,
            config: self.config,
            manager,
            facade,
            external_step: self.external_step,
        })
    }
}

impl std::fmt::Debug for OrderServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderServiceBuilder")
            .field("config", &self.config)
            .field("external_step", &self.external_step.is_some())
            .finish()
    }
}
