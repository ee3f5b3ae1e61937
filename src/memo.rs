//! Per-operation memoization with least-recently-used eviction.

use log::{debug, info};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of distinct argument combinations kept per operation.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

struct MemoState<K, V> {
    // value and the tick of its last use
    entries: HashMap<K, (V, u64)>,
    tick: u64,
}

/// Caches the results of one operation, keyed by its resolved arguments.
///
/// Entries live until evicted or until the owning client is dropped. Failed
/// calls are never stored. The lock is not held while the wrapped call runs,
/// so two threads missing on the same key may both perform the call.
pub(crate) struct Memo<K, V> {
    name: &'static str,
    capacity: usize,
    state: Mutex<MemoState<K, V>>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            state: Mutex::new(MemoState {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its success.
    pub(crate) fn get_or_try_insert_with<E>(
        &self,
        key: K,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            info!("Memo hit for {}", self.name);
            return Ok(value);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn get(&self, key: &K) -> Option<V> {
        let mut state = self.lock();
        state.tick += 1;
        let tick = state.tick;
        state.entries.get_mut(key).map(|(value, used)| {
            *used = tick;
            value.clone()
        })
    }

    fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();
        state.tick += 1;
        let tick = state.tick;
        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting least recently used {} entry", self.name);
                state.entries.remove(&oldest);
            }
        }
        state.entries.insert(key, (value, tick));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub(crate) fn clear(&self) {
        self.lock().entries.clear();
    }
}
