// FICHIER : sqldoc/src/json_db/storage/file_storage.rs

//! Primitives disque du moteur fichier : un document = un fichier JSON
//! `<db_root>/collections/<collection>/<id>.json`.

use crate::json_db::storage::Document;
use crate::utils::{AppError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Fichier de métadonnées d'une collection (indications d'index).
pub const META_FILE: &str = "_meta.json";

fn store_err(path: &Path, e: std::io::Error) -> AppError {
    AppError::StoreConnection(format!("{:?} : {}", path, e))
}

pub fn collections_root(db_root: &Path) -> PathBuf {
    db_root.join("collections")
}

pub fn collection_path(db_root: &Path, collection: &str) -> PathBuf {
    collections_root(db_root).join(collection)
}

pub fn document_path(db_root: &Path, collection: &str, id: &str) -> PathBuf {
    collection_path(db_root, collection).join(format!("{}.json", id))
}

/// Crée l'arborescence de la base. Échoue si la racine est inutilisable.
pub async fn create_db(db_root: &Path) -> Result<()> {
    let root = collections_root(db_root);
    fs::create_dir_all(&root)
        .await
        .map_err(|e| store_err(&root, e))
}

pub async fn create_collection(db_root: &Path, collection: &str, meta: &Value) -> Result<()> {
    let path = collection_path(db_root, collection);
    fs::create_dir_all(&path)
        .await
        .map_err(|e| store_err(&path, e))?;
    let content = serde_json::to_string_pretty(meta)?;
    atomic_write(path.join(META_FILE), content.as_bytes()).await
}

pub async fn list_collections(db_root: &Path) -> Result<Vec<String>> {
    let root = collections_root(db_root);
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    let mut entries = fs::read_dir(&root).await.map_err(|e| store_err(&root, e))?;
    while let Some(entry) = entries.next_entry().await.map_err(|e| store_err(&root, e))? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if is_dir {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Identifiants présents dans une collection, triés. Collection absente = vide.
pub async fn list_document_ids(db_root: &Path, collection: &str) -> Result<Vec<String>> {
    let path = collection_path(db_root, collection);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    let mut entries = fs::read_dir(&path).await.map_err(|e| store_err(&path, e))?;
    while let Some(entry) = entries.next_entry().await.map_err(|e| store_err(&path, e))? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == META_FILE {
            continue;
        }
        if let Some(id) = name.strip_suffix(".json") {
            ids.push(id.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

pub async fn read_document(db_root: &Path, collection: &str, id: &str) -> Result<Option<Document>> {
    let file_path = document_path(db_root, collection, id);
    if !file_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&file_path)
        .await
        .map_err(|e| store_err(&file_path, e))?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(doc) => Ok(Some(doc)),
        _ => Err(AppError::StoreConnection(format!(
            "Document corrompu (objet attendu) : {:?}",
            file_path
        ))),
    }
}

pub async fn write_document(db_root: &Path, collection: &str, id: &str, doc: &Document) -> Result<()> {
    let content = serde_json::to_string_pretty(doc)?;
    atomic_write(document_path(db_root, collection, id), content.as_bytes()).await
}

/// Renvoie `true` si un fichier a effectivement été supprimé.
pub async fn delete_document(db_root: &Path, collection: &str, id: &str) -> Result<bool> {
    let file_path = document_path(db_root, collection, id);
    if !file_path.exists() {
        return Ok(false);
    }
    fs::remove_file(&file_path)
        .await
        .map_err(|e| store_err(&file_path, e))?;
    Ok(true)
}

/// Écriture atomique sécurisée (write -> sync -> rename).
/// Chaque appel écrit dans son propre fichier temporaire.
pub async fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| store_err(parent, e))?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
    {
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| store_err(&temp_path, e))?;
        file.write_all(content)
            .await
            .map_err(|e| store_err(&temp_path, e))?;
        file.sync_all().await.map_err(|e| store_err(&temp_path, e))?;
    }

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| store_err(path, e))
}
