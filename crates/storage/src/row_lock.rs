//! FIFO exclusive row locks
//!
//! Each row owns one [`RowLock`]. Waiters are granted the lock strictly in
//! arrival order (ticket lock), so pessimistic transactions contending on a
//! row serialize in the order they asked.
//!
//! ```text
//!   next_ticket ──► 7   (next arrival gets 7)
//!   now_serving ──► 4   (holder has 4, tickets 5 and 6 wait)
//! ```

use orderlock_core::{LockToken, ResourceKey, RowLockHandle};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Debug, Default)]
struct TicketState {
    next_ticket: u64,
    now_serving: u64,
}

/// Exclusive, FIFO-granted lock guarding one row
#[derive(Debug, Default)]
pub struct RowLock {
    state: Mutex<TicketState>,
    granted: Condvar,
}

impl RowLock {
    /// Create an unheld lock
    pub fn new() -> Self {
        Self::default()
    }

    /// True while some transaction holds the lock
    pub fn is_held(&self) -> bool {
        let state = self.state.lock();
        state.next_ticket != state.now_serving
    }

    /// True while grant `ticket` is the current holder
    pub fn is_held_by(&self, ticket: u64) -> bool {
        let state = self.state.lock();
        state.now_serving == ticket && state.next_ticket != state.now_serving
    }

    /// Transactions holding or waiting for the lock
    pub fn queue_len(&self) -> u64 {
        let state = self.state.lock();
        state.next_ticket - state.now_serving
    }

    /// Block until the lock is granted
    pub fn acquire(self: &Arc<Self>, key: ResourceKey) -> RowLockGuard {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        while state.now_serving != ticket {
            self.granted.wait(&mut state);
        }
        RowLockGuard {
            lock: Arc::clone(self),
            key,
            ticket,
        }
    }

    fn release(&self) {
        {
            let mut state = self.state.lock();
            state.now_serving += 1;
        }
        // Every waiter re-checks its ticket; only the next one proceeds.
        self.granted.notify_all();
    }
}

/// Proof of holding a row's exclusive lock; releases on drop
#[derive(Debug)]
pub struct RowLockGuard {
    lock: Arc<RowLock>,
    key: ResourceKey,
    ticket: u64,
}

impl RowLockHandle for RowLockGuard {
    fn token(&self) -> LockToken {
        LockToken::new(self.key, self.ticket)
    }
}

impl Drop for RowLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}
