// FICHIER : sqldoc/src/json_db/collections/mod.rs

pub mod catalog;
pub mod manager;

pub use catalog::{CascadeRule, CollectionCatalog, CollectionSpec, IndexHint};
pub use manager::CollectionsManager;
