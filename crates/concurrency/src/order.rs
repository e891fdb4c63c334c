//! Order transaction: three debits and one record, all or nothing
//!
//! ```text
//!   coupon leg ──► stock leg ──► point leg ──► external step ──► commit
//!   (mode per      (mode per      (mode per     (optional,       (one batch:
//!    strategy)      strategy)      strategy)     e.g. payment)    rows + order)
//! ```
//!
//! Legs always run in this order, so exclusive locks are taken in key order
//! and two pessimistic orders cannot deadlock.

use crate::manager::TransactionManager;
use crate::strategy::LockStrategy;
use crate::transaction::{AttemptOutcome, TransactionContext};
use orderlock_core::{
    Coupon, Error, OrderRecord, OrderRequest, ResourceKey, ResourceStore, Result, Stock,
    UserPoint,
};
use std::sync::Arc;

/// A step that runs inside an order attempt after every leg is obtained
///
/// Models work such as a payment-gateway confirmation. Locks taken by
/// pessimistic legs stay held while it runs. Returning an error aborts the
/// attempt. The step may run once per attempt, so it must tolerate retries.
pub trait ExternalStep: Send + Sync {
    /// Run the step for `request`
    fn run(&self, request: &OrderRequest) -> Result<()>;
}

impl<F> ExternalStep for F
where
    F: Fn(&OrderRequest) -> Result<()> + Send + Sync,
{
    fn run(&self, request: &OrderRequest) -> Result<()> {
        self(request)
    }
}

/// Runs single order attempts under a [`LockStrategy`]
///
/// One attempt either commits all three debits plus the order record, or
/// changes nothing. Conflicts are returned to the caller; wrap the attempt
/// in a [`RetryingFacade`](crate::RetryingFacade) to retry them.
#[derive(Clone)]
pub struct OrderTransaction {
    strategy: LockStrategy,
    manager: Arc<TransactionManager>,
    external_step: Option<Arc<dyn ExternalStep>>,
}

impl OrderTransaction {
    /// Create with its own transaction manager
    pub fn new(strategy: LockStrategy) -> Self {
        Self::with_manager(strategy, Arc::new(TransactionManager::new()))
    }

    /// Create sharing an existing transaction manager
    pub fn with_manager(strategy: LockStrategy, manager: Arc<TransactionManager>) -> Self {
        Self {
            strategy,
            manager,
            external_step: None,
        }
    }

    /// Install a step that runs after the legs and before commit
    pub fn with_external_step(self, step: impl ExternalStep + 'static) -> Self {
        self.with_shared_step(Arc::new(step))
    }

    /// Install an already shared step
    pub fn with_shared_step(mut self, step: Arc<dyn ExternalStep>) -> Self {
        self.external_step = Some(step);
        self
    }

    /// Strategy in use
    pub fn strategy(&self) -> LockStrategy {
        self.strategy
    }

    /// Manager counting this transaction's attempts
    pub fn manager(&self) -> &Arc<TransactionManager> {
        &self.manager
    }

    /// Run one attempt
    ///
    /// # Errors
    /// - `Conflict` / `RowLocked`: an optimistic leg lost its race (retryable)
    /// - `NotFound`, `InsufficientResource`: terminal business errors
    /// - anything returned by the external step
    pub fn execute<S: ResourceStore>(&self, store: &S, request: &OrderRequest) -> Result<OrderRecord> {
        let result = self
            .manager
            .attempt(store, |txn| self.run_legs(txn, request))
            .and_then(|((), receipt)| {
                receipt
                    .order
                    .ok_or_else(|| Error::Internal("commit returned no order record".to_string()))
            });

        match (&result, AttemptOutcome::of(&result)) {
            (Ok(record), _) => tracing::debug!(
                order_id = record.id.get(),
                user_id = request.user_id.get(),
                strategy = %self.strategy,
                "order committed"
            ),
            (Err(e), AttemptOutcome::Conflict) => tracing::debug!(
                user_id = request.user_id.get(),
                strategy = %self.strategy,
                error = %e,
                "order attempt lost a version race"
            ),
            (Err(e), _) => tracing::debug!(
                user_id = request.user_id.get(),
                strategy = %self.strategy,
                error = %e,
                "order attempt aborted"
            ),
        }
        result
    }

    fn run_legs<S: ResourceStore>(
        &self,
        txn: &mut TransactionContext<'_, S>,
        request: &OrderRequest,
    ) -> Result<()> {
        let mut coupon: Coupon =
            txn.read(ResourceKey::coupon(request.coupon_id), self.strategy.coupon)?;
        coupon.decrease()?;
        txn.stage(coupon)?;

        let mut stock: Stock =
            txn.read(ResourceKey::stock(request.product_id), self.strategy.stock)?;
        stock.decrease(request.quantity)?;
        txn.stage(stock)?;

        let mut point: UserPoint =
            txn.read(ResourceKey::user_point(request.user_id), self.strategy.point)?;
        point.use_points(request.points)?;
        txn.stage(point)?;

        if let Some(step) = &self.external_step {
            step.run(request)?;
        }

        txn.stage_order(request.to_new_order())
    }
}

impl std::fmt::Debug for OrderTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderTransaction")
            .field("strategy", &self.strategy)
            .field("external_step", &self.external_step.is_some())
            .finish()
    }
}
