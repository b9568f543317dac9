//! Keyed single-flight map
//!
//! Each key owns a once-cell. The map lock is only held while fetching a
//! key's cell, so initialising one key never blocks callers of another.
//! Callers for the same key queue on the cell: the first runs `init`, the
//! rest observe its value. If `init` fails nothing is stored and the next
//! queued caller runs its own `init`. A failed key nobody else is waiting
//! on is dropped from the map.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Map of fingerprint to lazily computed value
pub struct FlightMap<V> {
    slots: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> FlightMap<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, key: &str) -> Arc<OnceCell<V>> {
        let mut slots = self.slots.lock().await;
        match slots.get(key) {
            Some(slot) => Arc::clone(slot),
            None => {
                let slot = Arc::new(OnceCell::new());
                slots.insert(key.to_string(), Arc::clone(&slot));
                slot
            }
        }
    }

    /// Return the value for `key`, running `init` if no value exists yet
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key).await;
        match slot.get_or_try_init(init).await {
            Ok(value) => Ok(value.clone()),
            Err(e) => {
                self.discard_failed(key, &slot).await;
                Err(e)
            }
        }
    }

    async fn discard_failed(&self, key: &str, slot: &Arc<OnceCell<V>>) {
        let mut slots = self.slots.lock().await;
        let ours = slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot));
        // one reference in the map plus ours; clones are only taken under the lock
        if ours && !slot.initialized() && Arc::strong_count(slot) == 2 {
            slots.remove(key);
        }
    }

    /// Store a value unless the key already has one
    pub async fn insert(&self, key: String, value: V) {
        let mut slots = self.slots.lock().await;
        match slots.get(&key) {
            Some(slot) => {
                // An in-flight or finished computation wins over a preloaded value
                let _ = slot.set(value);
            }
            None => {
                slots.insert(key, Arc::new(OnceCell::new_with(Some(value))));
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let slots = self.slots.lock().await;
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Snapshot of every computed entry
    pub async fn entries(&self) -> Vec<(String, V)> {
        let slots = self.slots.lock().await;
        slots
            .iter()
            .filter_map(|(key, slot)| slot.get().map(|v| (key.clone(), v.clone())))
            .collect()
    }

    pub async fn values(&self) -> Vec<V> {
        self.entries().await.into_iter().map(|(_, v)| v).collect()
    }

    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V: Clone> Default for FlightMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
