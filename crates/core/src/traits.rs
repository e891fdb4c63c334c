//! The storage boundary consumed by the order orchestrator
//!
//! A backend must provide two things beyond plain reads:
//!
//! 1. **Row-level exclusive locks** ([`ResourceStore::load_for_update`]):
//!    at most one holder per row, released when the returned handle drops.
//! 2. **Atomic batch commit** ([`ResourceStore::commit`]): every row write in
//!    a [`WriteBatch`] plus its order append takes effect, or none does.
//!    Conditional writes are compare-and-swap on the row version.
//!
//! The single-row operations (`save_if_version`, `save_unconditional`,
//! `append_order`) are provided on top of `commit`.

use crate::error::{Error, Result};
use crate::primitives::{NewOrder, OrderRecord, Resource};
use crate::types::ResourceKey;

/// One grant of a row's exclusive lock
///
/// Issued by the store when the lock is granted. A locked write carries the
/// token so the store can check that its author is the current holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken {
    key: ResourceKey,
    ticket: u64,
}

impl LockToken {
    /// Token for grant number `ticket` of the lock on `key`
    pub fn new(key: ResourceKey, ticket: u64) -> Self {
        Self { key, ticket }
    }

    /// Locked row
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// Grant number, unique per row
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// How a staged row write is validated at commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Commit only if the stored version still equals the version read and
    /// no other transaction holds the row exclusively
    Conditional,
    /// The writer holds the grant named by the token; no conflict is possible
    Locked(LockToken),
}

/// One row write staged for commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWrite {
    /// New row contents; its version field is the version that was read
    pub resource: Resource,
    /// Validation applied at commit
    pub mode: WriteMode,
}

impl RowWrite {
    /// A compare-and-swap write against the version carried by `resource`
    pub fn conditional(resource: Resource) -> Self {
        Self {
            resource,
            mode: WriteMode::Conditional,
        }
    }

    /// A write to a row the writer holds exclusively under `lock`
    pub fn locked(resource: Resource, lock: &impl RowLockHandle) -> Self {
        Self {
            resource,
            mode: WriteMode::Locked(lock.token()),
        }
    }

    /// Row address
    pub fn key(&self) -> ResourceKey {
        self.resource.key()
    }

    /// Version the writer read
    pub fn expected_version(&self) -> u64 {
        self.resource.version()
    }
}

/// Everything one transaction attempt makes durable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    /// Row writes, applied together
    pub writes: Vec<RowWrite>,
    /// Order appended with the writes
    pub order: Option<NewOrder>,
}

impl WriteBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a row write
    pub fn write(mut self, write: RowWrite) -> Self {
        self.writes.push(write);
        self
    }

    /// Stage an order append
    pub fn append(mut self, order: NewOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// True if committing would change nothing
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.order.is_none()
    }
}

/// Outcome of a successful batch commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Store-wide commit counter value assigned to this batch
    pub commit_version: u64,
    /// New version of every written row
    pub row_versions: Vec<(ResourceKey, u64)>,
    /// Appended order, if the batch carried one
    pub order: Option<OrderRecord>,
}

impl CommitReceipt {
    /// Version a row was committed at by this batch
    pub fn version_of(&self, key: ResourceKey) -> Option<u64> {
        self.row_versions
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

/// Handle proving an exclusive lock on one row
///
/// The lock is released when the handle is dropped.
pub trait RowLockHandle: Send {
    /// The grant this handle holds
    fn token(&self) -> LockToken;

    /// Locked row
    fn key(&self) -> ResourceKey {
        self.token().key()
    }
}

/// Persistence boundary for resource rows and order records
///
/// Implementations must be shareable across threads; every transaction
/// attempt receives the store by reference.
pub trait ResourceStore: Send + Sync {
    /// Exclusive lock handle type
    type Lock: RowLockHandle;

    /// Read a row and its version without locking
    ///
    /// # Errors
    /// `NotFound` if the row does not exist.
    fn load(&self, key: ResourceKey) -> Result<Resource>;

    /// Acquire the row's exclusive lock, then read it
    ///
    /// Blocks until the lock is granted.
    ///
    /// # Errors
    /// `NotFound` if the row does not exist.
    fn load_for_update(&self, key: ResourceKey) -> Result<(Resource, Self::Lock)>;

    /// Apply every write and the order append atomically
    ///
    /// # Errors
    /// - `Conflict` / `RowLocked` if any conditional write fails validation;
    ///   nothing is applied
    /// - `NotFound` if a written row does not exist
    /// - `InvalidState` if a locked write's token is not the row's current grant
    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt>;

    /// Compare-and-swap a single row; returns the new version
    fn save_if_version(&self, resource: Resource) -> Result<u64> {
        let key = resource.key();
        let receipt = self.commit(WriteBatch::new().write(RowWrite::conditional(resource)))?;
        committed_version(&receipt, key)
    }

    /// Write a single row held under `lock`; returns the new version
    ///
    /// # Errors
    /// `InvalidInput` if `lock` does not cover the row.
    fn save_unconditional(&self, resource: Resource, lock: &Self::Lock) -> Result<u64> {
        let key = resource.key();
        if lock.key() != key {
            return Err(Error::InvalidInput(format!(
                "lock on {} does not cover {}",
                lock.key(),
                key
            )));
        }
        let receipt = self.commit(WriteBatch::new().write(RowWrite::locked(resource, lock)))?;
        committed_version(&receipt, key)
    }

    /// Append an order on its own
    fn append_order(&self, order: NewOrder) -> Result<OrderRecord> {
        self.commit(WriteBatch::new().append(order))?
            .order
            .ok_or_else(|| Error::Internal("commit dropped the staged order".to_string()))
    }
}

fn committed_version(receipt: &CommitReceipt, key: ResourceKey) -> Result<u64> {
    receipt
        .version_of(key)
        .ok_or_else(|| Error::Internal(format!("commit receipt is missing {}", key)))
}
