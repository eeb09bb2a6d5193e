// FICHIER : sqldoc/src/json_db/storage/cache.rs

//! Cache LRU (Least Recently Used) thread-safe, partagé par clonage.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone)]
pub struct Cache<K: Hash + Eq, V> {
    // Mutex car LruCache promeut l'élément lu à chaque `get`.
    store: Arc<Mutex<LruCache<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            store: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.store.lock().ok()?;
        guard.get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        if let Ok(mut guard) = self.store.lock() {
            // L'insertion gère l'éviction si la capacité est dépassée
            guard.put(key, value);
        }
    }

    /// Renvoie la valeur en cache ou la calcule puis la mémorise.
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let value = compute();
        self.put(key, value.clone());
        value
    }

    pub fn remove(&self, key: &K) {
        if let Ok(mut guard) = self.store.lock() {
            guard.pop(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.store.lock() {
            guard.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
