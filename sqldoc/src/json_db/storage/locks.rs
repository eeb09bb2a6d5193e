// FICHIER : sqldoc/src/json_db/storage/locks.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Verrous d'écriture par collection, partagés par clonage.
///
/// Les écritures d'une même collection (fichier + cache) sont sérialisées ;
/// les lectures ne prennent aucun verrou.
#[derive(Debug, Default, Clone)]
pub struct LockManager {
    // Clé = nom de collection
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, collection: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(collection.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Attend le verrou d'écriture de la collection.
    pub async fn write(&self, collection: &str) -> OwnedMutexGuard<()> {
        self.lock_for(collection).lock_owned().await
    }
}
