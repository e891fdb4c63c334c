//! Transaction manager: id allocation and attempt statistics
//!
//! Every attempt begins through [`TransactionManager::begin`] and reports its
//! outcome through [`TransactionManager::record`]. The counters make the
//! strategies' trade-offs observable: optimistic workloads show conflicts,
//! pessimistic ones never do.

use crate::transaction::{AttemptOutcome, TransactionContext};
use orderlock_core::{CommitReceipt, ResourceStore, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the attempt counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    /// Attempts begun
    pub started: u64,
    /// Attempts committed
    pub committed: u64,
    /// Attempts aborted by a retryable conflict
    pub conflicts: u64,
    /// Attempts aborted by a business error
    pub business_aborts: u64,
    /// Attempts aborted for any other reason
    pub failures: u64,
}

/// Allocates transaction ids and counts attempt outcomes
///
/// Shared by every attempt a service runs; all methods take `&self`.
#[derive(Debug)]
pub struct TransactionManager {
    /// Next transaction ID
    next_txn_id: AtomicU64,
    started: AtomicU64,
    committed: AtomicU64,
    conflicts: AtomicU64,
    business_aborts: AtomicU64,
    failures: AtomicU64,
}

impl TransactionManager {
    /// Create a manager whose first transaction id is 1
    pub fn new() -> Self {
        TransactionManager {
            next_txn_id: AtomicU64::new(1),
            started: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            business_aborts: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Begin an attempt against `store`
    pub fn begin<'s, S: ResourceStore>(&self, store: &'s S) -> TransactionContext<'s, S> {
        self.started.fetch_add(1, Ordering::Relaxed);
        TransactionContext::new(self.next_txn_id(), store)
    }

    /// Run `body` as one attempt and commit whatever it staged
    ///
    /// If `body` or the commit fails the attempt is aborted, so its staged
    /// writes are discarded and its locks released. The outcome is recorded
    /// either way.
    pub fn attempt<'s, S, T, F>(&self, store: &'s S, body: F) -> Result<(T, CommitReceipt)>
    where
        S: ResourceStore,
        F: FnOnce(&mut TransactionContext<'s, S>) -> Result<T>,
    {
        let mut txn = self.begin(store);
        let result = body(&mut txn).and_then(|value| txn.commit().map(|receipt| (value, receipt)));

        if let Err(e) = &result {
            if txn.is_active() {
                // Cannot fail: the attempt is still active.
                let _ = txn.abort(e.to_string());
            }
        }
        self.record(AttemptOutcome::of(&result));
        result
    }

    /// Count an attempt's outcome
    pub fn record(&self, outcome: AttemptOutcome) {
        let counter = match outcome {
            AttemptOutcome::Committed => &self.committed,
            AttemptOutcome::Conflict => &self.conflicts,
            AttemptOutcome::Business => &self.business_aborts,
            AttemptOutcome::Failed => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counters
    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            business_aborts: self.business_aborts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
