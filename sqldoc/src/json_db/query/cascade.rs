// FICHIER : sqldoc/src/json_db/query/cascade.rs

//! Suppression en cascade le long des relations déclarées dans le catalogue.
//!
//! Les enfants sont découverts par scan de la collection enfant : la clé
//! étrangère peut contenir l'identifiant natif du parent ou son substitut
//! (entier ou chaîne numérique). Aucune atomicité : un échec au milieu de la
//! cascade laisse les suppressions précédentes acquises.

use crate::json_db::collections::{CascadeRule, CollectionCatalog};
use crate::json_db::identity::IdentifierTranslator;
use crate::json_db::records::ForeignKey;
use crate::json_db::storage::{DocumentStore, ID_FIELD};
use crate::utils::prelude::*;
use async_recursion::async_recursion;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Le document visé a été supprimé.
    pub deleted: bool,
    /// Nombre de descendants supprimés.
    pub cascaded: usize,
}

pub struct CascadeDeleter<'a> {
    store: &'a dyn DocumentStore,
    catalog: &'a CollectionCatalog,
    translator: &'a IdentifierTranslator,
}

impl<'a> CascadeDeleter<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        catalog: &'a CollectionCatalog,
        translator: &'a IdentifierTranslator,
    ) -> Self {
        Self {
            store,
            catalog,
            translator,
        }
    }

    /// Supprime les descendants puis le document lui-même.
    pub async fn delete(&self, collection: &str, native_id: &str) -> Result<DeleteReport> {
        let mut visited = HashSet::new();
        let cascaded = self
            .delete_dependents(collection, native_id, &mut visited)
            .await?;
        let deleted = self.store.delete(collection, native_id).await?;
        if deleted {
            info!(
                "🗑️ {}/{} supprimé ({} dépendant(s) en cascade)",
                collection, native_id, cascaded
            );
        }
        Ok(DeleteReport { deleted, cascaded })
    }

    #[async_recursion]
    async fn delete_dependents(
        &self,
        collection: &str,
        native_id: &str,
        visited: &mut HashSet<(String, String)>,
    ) -> Result<usize> {
        if !visited.insert((collection.to_string(), native_id.to_string())) {
            return Ok(0);
        }

        let surrogate = self.translator.surrogate(native_id);
        let rules: Vec<CascadeRule> = self.catalog.children_of(collection).cloned().collect();
        let mut removed = 0;

        for rule in rules {
            let children: Vec<String> = self
                .store
                .scan(&rule.child)
                .await?
                .into_iter()
                .filter(|child| {
                    child
                        .get(&rule.foreign_key)
                        .and_then(ForeignKey::from_value)
                        .is_some_and(|fk| fk.refers_to(native_id, surrogate))
                })
                .filter_map(|child| child.get(ID_FIELD).and_then(Value::as_str).map(str::to_string))
                .collect();

            for child_id in children {
                if visited.contains(&(rule.child.clone(), child_id.clone())) {
                    continue;
                }
                removed += self
                    .delete_dependents(&rule.child, &child_id, visited)
                    .await?;
                if self.store.delete(&rule.child, &child_id).await? {
                    debug!("🗑️ Cascade {} -> {}/{}", collection, rule.child, child_id);
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
