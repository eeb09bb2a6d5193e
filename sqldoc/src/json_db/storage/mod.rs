// FICHIER : sqldoc/src/json_db/storage/mod.rs

pub mod cache;
pub mod file_storage;
pub mod locks;
pub mod memory;

use crate::json_db::collections::catalog::IndexHint;
use crate::json_db::identity::new_native_id;
use crate::utils::prelude::*;
use async_trait::async_trait;
use std::path::PathBuf;

pub use memory::MemoryStore;

/// Document brut tel que stocké (contient `_id`).
pub type Document = Map<String, Value>;

/// Champ de l'identifiant natif dans un document stocké.
pub const ID_FIELD: &str = "_id";

// --- CONTRAT DU MAGASIN ---

/// Frontière avec le magasin de documents.
///
/// Une collection absente se comporte comme une collection vide. Les
/// identifiants sont renvoyés triés : les UUID v7 attribués par le magasin
/// suivent donc l'ordre de création.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Vérifie que le magasin est joignable.
    async fn ping(&self) -> Result<()>;

    async fn ensure_collection(&self, collection: &str, indexes: &[IndexHint]) -> Result<()>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    async fn scan(&self, collection: &str) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for id in self.list_ids(collection).await? {
            if let Some(doc) = self.get(collection, &id).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Insère un document. `id = None` : le magasin attribue un UUID v7.
    /// Un identifiant déjà présent est refusé (`DuplicateId`).
    async fn insert(&self, collection: &str, id: Option<String>, doc: Document) -> Result<String>;

    /// Remplace un document existant. `false` si l'identifiant est inconnu.
    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<bool>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Noms de collection et identifiants deviennent des noms de fichiers.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(AppError::InvalidIdentifier(format!("{} invalide : {:?}", kind, name)))
    }
}

fn prepare_document(mut doc: Document, id: &str) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc
}

// --- MOTEUR DE STOCKAGE (FICHIERS) ---

#[derive(Debug, Clone)]
pub struct StorageEngine {
    db_root: PathBuf,
    pub cache: cache::Cache<String, Document>,
    locks: locks::LockManager,
}

impl StorageEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db_root: config.db_root(),
            cache: cache::Cache::new(config.cache_capacity),
            locks: locks::LockManager::new(),
        }
    }

    pub fn db_root(&self) -> &PathBuf {
        &self.db_root
    }

    fn cache_key(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }
}

#[async_trait]
impl DocumentStore for StorageEngine {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn ping(&self) -> Result<()> {
        file_storage::create_db(&self.db_root).await
    }

    async fn ensure_collection(&self, collection: &str, indexes: &[IndexHint]) -> Result<()> {
        validate_name("collection", collection)?;
        let meta = json!({ "name": collection, "indexes": indexes });
        file_storage::create_collection(&self.db_root, collection, &meta).await
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        file_storage::list_collections(&self.db_root).await
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        validate_name("collection", collection)?;
        file_storage::list_document_ids(&self.db_root, collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        validate_name("collection", collection)?;
        if validate_name("id", id).is_err() {
            return Ok(None);
        }
        let key = Self::cache_key(collection, id);
        if let Some(doc) = self.cache.get(&key) {
            return Ok(Some(doc));
        }
        let doc = file_storage::read_document(&self.db_root, collection, id).await?;
        if let Some(d) = &doc {
            self.cache.put(key, d.clone());
        }
        Ok(doc)
    }

    async fn insert(&self, collection: &str, id: Option<String>, doc: Document) -> Result<String> {
        validate_name("collection", collection)?;
        let id = id.unwrap_or_else(new_native_id);
        validate_name("id", &id)?;
        let _guard = self.locks.write(collection).await;
        if file_storage::document_path(&self.db_root, collection, &id).exists() {
            return Err(AppError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        let doc = prepare_document(doc, &id);
        file_storage::write_document(&self.db_root, collection, &id, &doc).await?;
        self.cache.put(Self::cache_key(collection, &id), doc);
        Ok(id)
    }

    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<bool> {
        validate_name("collection", collection)?;
        if validate_name("id", id).is_err() {
            return Ok(false);
        }
        let _guard = self.locks.write(collection).await;
        if !file_storage::document_path(&self.db_root, collection, id).exists() {
            return Ok(false);
        }
        let doc = prepare_document(doc, id);
        file_storage::write_document(&self.db_root, collection, id, &doc).await?;
        self.cache.put(Self::cache_key(collection, id), doc);
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        validate_name("collection", collection)?;
        if validate_name("id", id).is_err() {
            return Ok(false);
        }
        let _guard = self.locks.write(collection).await;
        self.cache.remove(&Self::cache_key(collection, id));
        file_storage::delete_document(&self.db_root, collection, id).await
    }

    async fn close(&self) -> Result<()> {
        self.cache.clear();
        Ok(())
    }
}
