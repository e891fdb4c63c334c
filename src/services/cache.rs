//! Look-aside cache with TTL and generation-guarded fills.
//!
//! Each key has a slot holding an optional cached value and a generation.
//! `evict` bumps the generation; a fill is only stored if the generation it
//! saw before loading is still current. A load that raced a committed write
//! therefore returns its value to its own caller but never caches it.
//!
//! ```text
//!   reader:  gen=3 ── load(v0) ─────────────────── fill(v0, seen=3)  → dropped
//!   writer:              commit(v1) ── evict → gen=4
//! ```

use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Slot<V> {
    generation: u64,
    entry: Option<(V, Instant)>,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            generation: 0,
            entry: None,
        }
    }
}

pub(crate) struct LookAside<K, V> {
    slots: DashMap<K, Slot<V>>,
    ttl: Duration,
    name: &'static str,
}

impl<K, V> LookAside<K, V>
where
    K: Eq + Hash + Copy + fmt::Display,
    V: Clone,
{
    pub(crate) fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            name,
        }
    }

    /// Cached value, if present and fresh.
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.slots.get(key).and_then(|slot| {
            slot.entry
                .as_ref()
                .filter(|(_, cached_at)| cached_at.elapsed() < self.ttl)
                .map(|(value, _)| value.clone())
        })
    }

    /// Serve `key` from the cache, or run `load` and cache its result.
    pub(crate) fn get_or_load<E>(&self, key: K, load: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let seen = self.generation(&key);
        let value = load()?;
        if !self.fill(key, value.clone(), seen) {
            tracing::debug!(cache = self.name, key = %key, "load raced an eviction, not cached");
        }
        Ok(value)
    }

    /// Drop the cached value and invalidate in-flight loads of `key`.
    pub(crate) fn evict(&self, key: K) {
        let had_entry = {
            let mut slot = self.slots.entry(key).or_insert_with(Slot::empty);
            slot.generation += 1;
            slot.entry.take().is_some()
        };
        if had_entry {
            tracing::info!(cache = self.name, key = %key, "cache entry evicted");
        }
    }

    fn generation(&self, key: &K) -> u64 {
        self.slots.get(key).map_or(0, |slot| slot.generation)
    }

    fn fill(&self, key: K, value: V, seen: u64) -> bool {
        let mut slot = self.slots.entry(key).or_insert_with(Slot::empty);
        if slot.generation != seen {
            return false;
        }
        slot.entry = Some((value, Instant::now()));
        true
    }
}

impl<K: Eq + Hash, V> fmt::Debug for LookAside<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookAside")
            .field("name", &self.name)
            .field("slots", &self.slots.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
