// FICHIER : sqldoc/src/json_db/collections/manager.rs

use crate::json_db::collections::catalog::CollectionCatalog;
use crate::json_db::storage::DocumentStore;
use crate::utils::prelude::*;

pub struct CollectionsManager<'a> {
    pub store: &'a dyn DocumentStore,
    pub catalog: &'a CollectionCatalog,
}

impl<'a> CollectionsManager<'a> {
    pub fn new(store: &'a dyn DocumentStore, catalog: &'a CollectionCatalog) -> Self {
        Self { store, catalog }
    }

    /// Crée (si besoin) chaque collection du catalogue avec ses indications
    /// d'index. Idempotent. Renvoie le nombre de collections assurées.
    #[instrument(skip(self))]
    pub async fn init_db(&self) -> Result<usize> {
        self.store.ping().await?;
        for spec in &self.catalog.collections {
            self.store.ensure_collection(&spec.name, &spec.indexes).await?;
            debug!("📁 Collection prête : {} ({} index)", spec.name, spec.indexes.len());
        }
        for name in self.unknown_collections().await? {
            warn!("⚠️ Collection '{}' présente dans le magasin mais hors catalogue", name);
        }
        info!(
            "✅ Base initialisée : {} collections",
            self.catalog.collections.len()
        );
        Ok(self.catalog.collections.len())
    }

    /// Collections présentes dans le magasin mais absentes du catalogue.
    pub async fn unknown_collections(&self) -> Result<Vec<String>> {
        let existing = self.store.list_collections().await?;
        Ok(existing
            .into_iter()
            .filter(|name| self.catalog.get(name).is_none())
            .collect())
    }
}
