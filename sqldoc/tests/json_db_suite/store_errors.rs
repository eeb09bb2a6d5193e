// FICHIER : sqldoc/tests/json_db_suite/store_errors.rs

use crate::{init_tracing, TEST_DB};
use async_trait::async_trait;
use serde_json::json;
use sqldoc::json_db::collections::{CollectionCatalog, IndexHint};
use sqldoc::json_db::storage::{Document, DocumentStore, MemoryStore};
use sqldoc::{AppConfig, AppError, DbConnection, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Magasin qui répond au ping puis tombe à la première vraie opération.
struct BrokenStore;

fn down() -> AppError {
    AppError::StoreConnection("magasin injoignable (simulé)".into())
}

#[async_trait]
impl DocumentStore for BrokenStore {
    fn backend_name(&self) -> &'static str {
        "broken"
    }
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
    async fn ensure_collection(&self, _: &str, _: &[IndexHint]) -> Result<()> {
        Err(down())
    }
    async fn list_collections(&self) -> Result<Vec<String>> {
        Err(down())
    }
    async fn list_ids(&self, _: &str) -> Result<Vec<String>> {
        Err(down())
    }
    async fn get(&self, _: &str, _: &str) -> Result<Option<Document>> {
        Err(down())
    }
    async fn insert(&self, _: &str, _: Option<String>, _: Document) -> Result<String> {
        Err(down())
    }
    async fn replace(&self, _: &str, _: &str, _: Document) -> Result<bool> {
        Err(down())
    }
    async fn delete(&self, _: &str, _: &str) -> Result<bool> {
        Err(down())
    }
}

/// Magasin mémoire qui compte les accès.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    fn backend_name(&self) -> &'static str {
        "counting"
    }
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
    async fn ensure_collection(&self, c: &str, i: &[IndexHint]) -> Result<()> {
        self.hit();
        self.inner.ensure_collection(c, i).await
    }
    async fn list_collections(&self) -> Result<Vec<String>> {
        self.hit();
        self.inner.list_collections().await
    }
    async fn list_ids(&self, c: &str) -> Result<Vec<String>> {
        self.hit();
        self.inner.list_ids(c).await
    }
    async fn get(&self, c: &str, id: &str) -> Result<Option<Document>> {
        self.hit();
        self.inner.get(c, id).await
    }
    async fn insert(&self, c: &str, id: Option<String>, d: Document) -> Result<String> {
        self.hit();
        self.inner.insert(c, id, d).await
    }
    async fn replace(&self, c: &str, id: &str, d: Document) -> Result<bool> {
        self.hit();
        self.inner.replace(c, id, d).await
    }
    async fn delete(&self, c: &str, id: &str) -> Result<bool> {
        self.hit();
        self.inner.delete(c, id).await
    }
}

fn config() -> AppConfig {
    AppConfig {
        database: TEST_DB.to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_store_failure_propagates_from_every_operation() {
    init_tracing();
    let conn = DbConnection::open_with_store(
        config(),
        Arc::new(BrokenStore),
        CollectionCatalog::default(),
    )
    .await
    .unwrap();

    let err = conn.init_db().await.unwrap_err();
    assert!(err.is_connection(), "{:?}", err);

    let err = conn.read("SELECT * FROM videos", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::StoreConnection(_)), "{:?}", err);

    let err = conn
        .insert("INSERT INTO videos (title) VALUES (?)", &[json!("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreConnection(_)), "{:?}", err);

    let err = conn
        .update("UPDATE videos SET title = ? WHERE id = ?", &[json!("y"), json!(42)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreConnection(_)), "{:?}", err);

    let err = conn
        .delete("DELETE FROM videos WHERE id = ?", &[json!(42)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreConnection(_)), "{:?}", err);

    let err = conn.native_of(42, "videos").await.unwrap_err();
    assert!(err.is_connection());
}

#[tokio::test]
async fn test_malformed_queries_never_reach_the_store() {
    init_tracing();
    let store = Arc::new(CountingStore::default());
    let conn = DbConnection::open_with_store(
        config(),
        store.clone(),
        CollectionCatalog::empty(),
    )
    .await
    .unwrap();

    let err = conn.read("SELEC * FROM videos", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::UnsupportedQuery(_)), "{:?}", err);

    let err = conn
        .read("SELECT * FROM videos WHERE title = ?", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parse { .. }), "{:?}", err);

    let err = conn
        .insert("INSERT INTO videos (a, b) VALUES (?)", &[json!(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parse { .. }), "{:?}", err);

    let err = conn
        .update("UPDATE videos WHERE id = ?", &[json!(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parse { .. }), "{:?}", err);

    // Mauvais verbe pour l'opération demandée
    let err = conn.update("SELECT * FROM videos", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Parse { .. }), "{:?}", err);

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}
