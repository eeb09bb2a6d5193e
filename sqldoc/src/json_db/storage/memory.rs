// FICHIER : sqldoc/src/json_db/storage/memory.rs

//! Magasin en mémoire : même contrat que le moteur fichier, sans persistance.

use super::{prepare_document, validate_name, Document, DocumentStore};
use crate::json_db::collections::catalog::IndexHint;
use crate::json_db::identity::new_native_id;
use crate::utils::{AppError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_collection(&self, collection: &str, _indexes: &[IndexHint]) -> Result<()> {
        validate_name("collection", collection)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, id: Option<String>, doc: Document) -> Result<String> {
        validate_name("collection", collection)?;
        let id = id.unwrap_or_else(new_native_id);
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(AppError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        docs.insert(id.clone(), prepare_document(doc, &id));
        Ok(id)
    }

    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<bool> {
        let mut guard = self.collections.write().await;
        match guard.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
            Some(slot) => {
                *slot = prepare_document(doc, id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }
}
