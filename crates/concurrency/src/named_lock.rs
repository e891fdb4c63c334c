//! Named mutual exclusion outside any transaction
//!
//! A registry of exclusive locks keyed by arbitrary names such as
//! `lock:stock:42`. Acquisition waits at most a caller-supplied duration and
//! fails with `LockTimeout` instead of proceeding unlocked. The guard
//! releases on drop.
//!
//! A name's entry lives only while someone holds or waits for it: the last
//! guard to drop with no other waiter removes it, so the registry does not
//! grow with every product ever locked.

use dashmap::DashMap;
use orderlock_core::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct NamedLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl NamedLock {
    fn try_acquire_until(&self, deadline: Instant) -> bool {
        let mut held = self.held.lock();
        while *held {
            if self.released.wait_until(&mut held, deadline).timed_out() && *held {
                return false;
            }
        }
        *held = true;
        true
    }

    fn release(&self) {
        *self.held.lock() = false;
        self.released.notify_one();
    }
}

type Registry = DashMap<String, Arc<NamedLock>>;

/// Registry of named exclusive locks
#[derive(Debug, Default)]
pub struct NamedLocks {
    locks: Arc<Registry>,
}

impl NamedLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire `name`, waiting at most `wait`
    ///
    /// # Errors
    /// `LockTimeout` if the lock is still held when `wait` elapses.
    pub fn try_lock_for(&self, name: &str, wait: Duration) -> Result<NamedLockGuard> {
        let lock = self
            .locks
            .entry(name.to_string())
            .or_default()
            .value()
            .clone();

        let started = Instant::now();
        if !lock.try_acquire_until(started + wait) {
            let waited_ms = started.elapsed().as_millis() as u64;
            tracing::warn!(lock = name, waited_ms, "named lock wait timed out");
            return Err(Error::LockTimeout {
                name: name.to_string(),
                waited_ms,
            });
        }

        tracing::trace!(lock = name, "named lock acquired");
        Ok(NamedLockGuard {
            name: name.to_string(),
            lock,
            registry: Arc::clone(&self.locks),
        })
    }

    /// Check if `name` is currently held
    pub fn is_held(&self, name: &str) -> bool {
        self.locks
            .get(name)
            .map(|lock| *lock.held.lock())
            .unwrap_or(false)
    }

    /// Names currently held or waited for
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True if no name is held or waited for
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds a named lock until dropped
#[derive(Debug)]
pub struct NamedLockGuard {
    name: String,
    lock: Arc<NamedLock>,
    registry: Arc<Registry>,
}

impl NamedLockGuard {
    /// Lock name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        self.lock.release();
        // Only the registry and this guard reference the lock: nobody waits.
        self.registry.remove_if(&self.name, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
        tracing::trace!(lock = %self.name, "named lock released");
    }
}
