//! Sharded in-memory resource store
//!
//! Rows live in a DashMap keyed by [`ResourceKey`]; each row has its own
//! FIFO [`RowLock`]. Orders are kept in an append-only log indexed by buyer.
//!
//! # Design
//!
//! - Reads (`load`, `snapshot`) take the commit gate shared
//! - `commit` takes the commit gate exclusively: validate → allocate version → apply
//! - Row locks are independent of the gate; waiting for a row lock never
//!   holds the gate
//!
//! # Thread Safety
//!
//! The commit gate closes the TOCTOU window between validation and apply:
//! no other commit can move a row's version after this commit validated it,
//! and no reader can observe a batch half-applied.

use crate::row_lock::{RowLock, RowLockGuard};
use chrono::Utc;
use dashmap::DashMap;
use orderlock_core::{
    CommitReceipt, Error, NewOrder, OrderId, OrderRecord, Resource, ResourceKey, ResourceStore,
    Result, RowWrite, UserId, WriteBatch, WriteMode,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Append-only order log with a per-buyer index
#[derive(Debug, Default)]
struct OrderLog {
    records: Vec<OrderRecord>,
    by_user: FxHashMap<UserId, Vec<usize>>,
}

impl OrderLog {
    fn push(&mut self, record: OrderRecord) {
        let idx = self.records.len();
        self.by_user.entry(record.user_id).or_default().push(idx);
        self.records.push(record);
    }
}

/// Every row and the order count, observed at one commit boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Commit counter at the time of the snapshot
    pub commit_version: u64,
    /// All rows, sorted by key
    pub rows: Vec<Resource>,
    /// Orders appended so far
    pub order_count: usize,
}

impl StoreSnapshot {
    /// Row at `key`, if present
    pub fn row(&self, key: ResourceKey) -> Option<&Resource> {
        self.rows.iter().find(|r| r.key() == key)
    }
}

/// Sharded store - DashMap by row key, FIFO row locks, gated batch commit
///
/// # Example
///
/// ```
/// use orderlock_core::{Coupon, CouponId, ResourceKey, ResourceStore};
/// use orderlock_storage::ShardedStore;
///
/// let store = ShardedStore::new();
/// store.insert(Coupon::new(CouponId(1), "launch", 100));
///
/// let row = store.load(ResourceKey::coupon(CouponId(1))).unwrap();
/// assert_eq!(row.level(), 100);
/// assert_eq!(row.version(), 0);
/// ```
pub struct ShardedStore {
    rows: DashMap<ResourceKey, Resource>,
    locks: DashMap<ResourceKey, Arc<RowLock>>,
    orders: RwLock<OrderLog>,
    commit_gate: RwLock<()>,
    /// Global commit counter, incremented once per committed batch
    version: AtomicU64,
    next_order_id: AtomicU64,
}

impl ShardedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            locks: DashMap::new(),
            orders: RwLock::new(OrderLog::default()),
            commit_gate: RwLock::new(()),
            version: AtomicU64::new(0),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Create with expected number of rows
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            rows: DashMap::with_capacity(rows),
            locks: DashMap::with_capacity(rows),
            ..Self::new()
        }
    }

    /// Seed a row, replacing any existing one
    ///
    /// Seeding is setup, not a transaction: call it before the workload starts.
    pub fn insert(&self, resource: impl Into<Resource>) {
        let resource = resource.into();
        let key = resource.key();
        let _gate = self.commit_gate.write();
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(RowLock::new()));
        self.rows.insert(key, resource);
    }

    /// Current global commit counter
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    #[inline]
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if a row exists
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.rows.contains_key(key)
    }

    /// True while some transaction holds the row's exclusive lock
    pub fn is_locked(&self, key: &ResourceKey) -> bool {
        self.locks
            .get(key)
            .map(|lock| lock.is_held())
            .unwrap_or(false)
    }

    /// Number of orders appended
    pub fn order_count(&self) -> usize {
        self.orders.read().records.len()
    }

    /// All orders in append order
    pub fn orders(&self) -> Vec<OrderRecord> {
        self.orders.read().records.clone()
    }

    /// Orders placed by one buyer, in append order
    pub fn orders_for_user(&self, user_id: UserId) -> Vec<OrderRecord> {
        let log = self.orders.read();
        log.by_user
            .get(&user_id)
            .map(|idxs| idxs.iter().map(|&i| log.records[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Consistent view of every row and the order count
    pub fn snapshot(&self) -> StoreSnapshot {
        let _gate = self.commit_gate.read();
        let mut rows: Vec<Resource> = self.rows.iter().map(|e| e.value().clone()).collect();
        rows.sort_by_key(|r| r.key());
        StoreSnapshot {
            commit_version: self.version(),
            rows,
            order_count: self.order_count(),
        }
    }

    fn lock_for(&self, key: ResourceKey) -> Result<Arc<RowLock>> {
        self.locks
            .get(&key)
            .map(|lock| Arc::clone(lock.value()))
            .ok_or_else(|| Error::not_found(key))
    }

    /// Check one staged write against the current row. Caller holds the gate.
    fn validate(&self, write: &RowWrite) -> Result<()> {
        let key = write.key();
        let actual = self
            .rows
            .get(&key)
            .map(|row| row.version())
            .ok_or_else(|| Error::not_found(key))?;
        let expected = write.expected_version();

        match write.mode {
            WriteMode::Conditional => {
                if self.is_locked(&key) {
                    return Err(Error::RowLocked { key });
                }
                if actual != expected {
                    return Err(Error::Conflict {
                        key,
                        expected,
                        actual,
                    });
                }
            }
            WriteMode::Locked(token) => {
                if token.key() != key {
                    return Err(Error::InvalidInput(format!(
                        "lock on {} does not cover {}",
                        token.key(),
                        key
                    )));
                }
                if !self.lock_for(key)?.is_held_by(token.ticket()) {
                    return Err(Error::InvalidState(format!(
                        "locked write to {} without holding its lock",
                        key
                    )));
                }
                if actual != expected {
                    tracing::error!(
                        key = %key,
                        expected,
                        actual,
                        "row moved while exclusively locked"
                    );
                    return Err(Error::Internal(format!(
                        "{} moved from version {} to {} under an exclusive lock",
                        key, expected, actual
                    )));
                }
            }
        }
        Ok(())
    }

    fn append_locked(&self, order: NewOrder) -> OrderRecord {
        let id = OrderId(self.next_order_id.fetch_add(1, Ordering::AcqRel));
        let record = order.into_record(id, Utc::now().timestamp_millis());
        self.orders.write().push(record.clone());
        record
    }
}

impl ResourceStore for ShardedStore {
    type Lock = RowLockGuard;

    fn load(&self, key: ResourceKey) -> Result<Resource> {
        let _gate = self.commit_gate.read();
        self.rows
            .get(&key)
            .map(|row| row.value().clone())
            .ok_or_else(|| Error::not_found(key))
    }

    fn load_for_update(&self, key: ResourceKey) -> Result<(Resource, RowLockGuard)> {
        let lock = self.lock_for(key)?;
        let guard = lock.acquire(key);
        let resource = self.load(key)?;
        Ok((resource, guard))
    }

    /// Apply a batch of writes and an order append atomically
    ///
    /// # Commit Sequence
    ///
    /// ```text
    /// 1. Acquire commit gate (exclusive)
    /// 2. Validate every write; on the first failure return it, nothing applied
    /// 3. Allocate commit version
    /// 4. Stamp each row with expected_version + 1 and store it
    /// 5. Append the order with a fresh id
    /// 6. Release gate
    /// ```
    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        let _gate = self.commit_gate.write();

        for write in &batch.writes {
            self.validate(write)?;
        }

        let commit_version = self.next_version();
        let mut row_versions = Vec::with_capacity(batch.writes.len());
        for write in batch.writes {
            let key = write.key();
            let new_version = write.expected_version() + 1;
            self.rows.insert(key, write.resource.stamp(new_version));
            row_versions.push((key, new_version));
        }

        let order = batch.order.map(|o| self.append_locked(o));

        tracing::debug!(
            commit_version,
            rows = row_versions.len(),
            order_id = order.as_ref().map(|o| o.id.get()),
            "batch committed"
        );

        Ok(CommitReceipt {
            commit_version,
            row_versions,
            order,
        })
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("row_count", &self.row_count())
            .field("order_count", &self.order_count())
            .field("version", &self.version())
            .finish()
    }
}
