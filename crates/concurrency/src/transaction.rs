//! Transaction context for one order attempt
//!
//! TransactionContext tracks every row an attempt obtained, how it was
//! obtained, the exclusive locks it holds, and the writes it staged. Nothing
//! reaches the store until [`TransactionContext::commit`], which hands the
//! whole set to the store as one [`WriteBatch`].
//!
//! Exclusive locks are released when the attempt commits, aborts, or the
//! context is dropped, whichever happens first.

use crate::strategy::LockMode;
use orderlock_core::{
    CommitReceipt, Error, NewOrder, Resource, ResourceKey, ResourceStore, Result, RowLockHandle,
    RowWrite, VersionedResource, WriteBatch,
};
use smallvec::SmallVec;
use std::time::{Duration, Instant};

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (begin commit)
/// - `Validating` → `Committed` (store accepted the batch)
/// - `Validating` → `Aborted` (store rejected the batch)
/// - `Active` → `Aborted` (business error or explicit abort)
///
/// Terminal states (no transitions allowed):
/// - `Committed`
/// - `Aborted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read and stage writes
    Active,
    /// Batch handed to the store
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// How an attempt ended, for logging and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Everything committed
    Committed,
    /// Aborted by a retryable conflict
    Conflict,
    /// Aborted by a missing row or an exhausted counter
    Business,
    /// Aborted for any other reason
    Failed,
}

impl AttemptOutcome {
    /// Classify an attempt result
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => AttemptOutcome::Committed,
            Err(e) if e.is_conflict() => AttemptOutcome::Conflict,
            Err(e) if e.is_business() => AttemptOutcome::Business,
            Err(_) => AttemptOutcome::Failed,
        }
    }
}

#[derive(Debug)]
struct ReadEntry {
    original: Resource,
    mode: LockMode,
}

/// Read/lock/write tracking for one attempt against store `S`
pub struct TransactionContext<'s, S: ResourceStore> {
    /// Unique id of this attempt
    pub txn_id: u64,
    store: &'s S,
    status: TransactionStatus,
    reads: SmallVec<[ReadEntry; 3]>,
    locks: SmallVec<[S::Lock; 3]>,
    writes: SmallVec<[RowWrite; 3]>,
    order: Option<NewOrder>,
    started_at: Instant,
}

impl<'s, S: ResourceStore> TransactionContext<'s, S> {
    /// Begin an attempt against `store`
    pub fn new(txn_id: u64, store: &'s S) -> Self {
        Self {
            txn_id,
            store,
            status: TransactionStatus::Active,
            reads: SmallVec::new(),
            locks: SmallVec::new(),
            writes: SmallVec::new(),
            order: None,
            started_at: Instant::now(),
        }
    }

    /// Current status
    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Abort reason, if aborted
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            TransactionStatus::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    /// Time since the attempt began
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Exclusive locks currently held
    pub fn held_locks(&self) -> usize {
        self.locks.len()
    }

    /// Writes staged so far (clean rows are never staged)
    pub fn staged_writes(&self) -> usize {
        self.writes.len()
    }

    /// Version read for `key`, if this attempt read it
    pub fn read_version(&self, key: ResourceKey) -> Option<u64> {
        self.reads
            .iter()
            .find(|r| r.original.key() == key)
            .map(|r| r.original.version())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Obtain a row in `mode`
    ///
    /// - `Optimistic`: snapshot read, no lock; the version read is checked at commit
    /// - `Pessimistic`: blocks for the row's exclusive lock, then reads
    ///
    /// # Errors
    /// `NotFound` if the row does not exist; `InvalidState` if the row was
    /// already read by this attempt or the attempt is not active.
    pub fn read<T: VersionedResource>(&mut self, key: ResourceKey, mode: LockMode) -> Result<T> {
        self.ensure_active()?;
        if self.read_version(key).is_some() {
            return Err(Error::InvalidState(format!(
                "{} already read by transaction {}",
                key, self.txn_id
            )));
        }

        let resource = match mode {
            LockMode::Optimistic => self.store.load(key)?,
            LockMode::Pessimistic => {
                let (resource, lock) = self.store.load_for_update(key)?;
                self.locks.push(lock);
                resource
            }
        };

        tracing::trace!(
            txn_id = self.txn_id,
            key = %key,
            version = resource.version(),
            mode = %mode,
            "row obtained"
        );

        self.reads.push(ReadEntry {
            original: resource.clone(),
            mode,
        });
        T::from_resource(resource)
    }

    /// Stage the mutated copy of a row read earlier
    ///
    /// A copy equal to what was read is not staged, so a no-op mutation never
    /// advances the row's version.
    ///
    /// # Errors
    /// `InvalidState` if the row was not read by this attempt.
    pub fn stage<T: VersionedResource>(&mut self, value: T) -> Result<()> {
        self.ensure_active()?;
        let key = value.key();
        let entry = self
            .reads
            .iter()
            .find(|r| r.original.key() == key)
            .ok_or_else(|| {
                Error::InvalidState(format!(
                    "{} staged without being read by transaction {}",
                    key, self.txn_id
                ))
            })?;

        let resource = value.into_resource();
        if resource.version() != entry.original.version() {
            return Err(Error::InvalidState(format!(
                "{} staged at version {} but read at {}",
                key,
                resource.version(),
                entry.original.version()
            )));
        }

        self.writes.retain(|w| w.key() != key);
        if resource == entry.original {
            return Ok(());
        }
        let write = match entry.mode {
            LockMode::Optimistic => RowWrite::conditional(resource),
            LockMode::Pessimistic => {
                let lock = self.locks.iter().find(|l| l.key() == key).ok_or_else(|| {
                    Error::InvalidState(format!(
                        "{} read for update but its lock is no longer held by transaction {}",
                        key, self.txn_id
                    ))
                })?;
                RowWrite::locked(resource, lock)
            }
        };
        self.writes.push(write);
        Ok(())
    }

    /// Stage the order record appended on commit
    pub fn stage_order(&mut self, order: NewOrder) -> Result<()> {
        self.ensure_active()?;
        self.order = Some(order);
        Ok(())
    }

    /// Commit every staged write and the staged order atomically
    ///
    /// On failure the attempt is aborted and the store is untouched. Locks are
    /// released either way.
    ///
    /// # State Transition
    /// `Active` → `Validating` → `Committed` | `Aborted`
    pub fn commit(&mut self) -> Result<CommitReceipt> {
        self.ensure_active()?;
        self.status = TransactionStatus::Validating;

        let batch = WriteBatch {
            writes: self.writes.drain(..).collect(),
            order: self.order.take(),
        };
        let result = self.store.commit(batch);

        match &result {
            Ok(receipt) => {
                self.status = TransactionStatus::Committed;
                tracing::debug!(
                    txn_id = self.txn_id,
                    commit_version = receipt.commit_version,
                    elapsed_us = self.elapsed().as_micros() as u64,
                    "transaction committed"
                );
            }
            Err(e) => {
                self.status = TransactionStatus::Aborted {
                    reason: e.to_string(),
                };
            }
        }
        self.locks.clear();
        result
    }

    /// Abort the attempt, discarding staged writes and releasing locks
    ///
    /// # Errors
    /// `InvalidState` if already `Committed` or `Aborted`.
    pub fn abort(&mut self, reason: impl Into<String>) -> Result<()> {
        match &self.status {
            TransactionStatus::Committed => Err(Error::InvalidState(format!(
                "cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(Error::InvalidState(format!(
                "transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted {
                    reason: reason.into(),
                };
                self.writes.clear();
                self.order = None;
                self.locks.clear();
                Ok(())
            }
        }
    }
}

impl<S: ResourceStore> std::fmt::Debug for TransactionContext<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("status", &self.status)
            .field("reads", &self.reads.len())
            .field("locks", &self.locks.len())
            .field("writes", &self.writes.len())
            .finish()
    }
}
