// FICHIER : sqldoc/src/json_db/connection.rs

//! Point d'entrée des appelants : une connexion explicite, ouverte et fermée
//! par la racine de composition, exposant les quatre opérations.

use crate::json_db::collections::{CollectionCatalog, CollectionsManager};
use crate::json_db::identity::IdentifierTranslator;
use crate::json_db::query::{parse, QueryDescriptor, QueryEngine, QueryKind, QueryOutcome};
use crate::json_db::records::CollectionRecord;
use crate::json_db::storage::{DocumentStore, MemoryStore, StorageEngine};
use crate::json_db::values::Record;
use crate::utils::config::StoreBackend;
use crate::utils::prelude::*;
use std::sync::Arc;

pub struct DbConnection {
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
    catalog: CollectionCatalog,
    translator: IdentifierTranslator,
}

impl DbConnection {
    /// Ouvre le magasin désigné par la configuration et vérifie qu'il répond.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.backend {
            StoreBackend::File => Arc::new(StorageEngine::new(&config)),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Self::open_with_store(config, store, CollectionCatalog::default()).await
    }

    /// Variante à injection (tests, magasins alternatifs).
    pub async fn open_with_store(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        catalog: CollectionCatalog,
    ) -> Result<Self> {
        store.ping().await?;
        info!(
            "🔌 Connexion ouverte ({}, base '{}')",
            store.backend_name(),
            config.database
        );
        Ok(Self {
            translator: IdentifierTranslator::new(config.cache_capacity),
            config,
            store,
            catalog,
        })
    }

    pub fn with_catalog(mut self, catalog: CollectionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn catalog(&self) -> &CollectionCatalog {
        &self.catalog
    }

    pub async fn close(self) -> Result<()> {
        self.store.close().await?;
        info!("🔌 Connexion fermée");
        Ok(())
    }

    /// Assure l'existence des collections du catalogue et de leurs index.
    pub async fn init_db(&self) -> Result<usize> {
        CollectionsManager::new(self.store(), &self.catalog)
            .init_db()
            .await
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(self.store(), &self.catalog, &self.translator)
            .with_timestamp_policy(self.config.timestamp_policy)
    }

    fn prepare(&self, query: &str, params: &[Value], expected: QueryKind) -> Result<QueryDescriptor> {
        let descriptor = parse(query, params)?;
        if descriptor.kind() != expected {
            return Err(AppError::parse(
                query,
                format!(
                    "instruction {:?} reçue là où {:?} est attendue",
                    descriptor.kind(),
                    expected
                ),
            ));
        }
        Ok(descriptor)
    }

    /// Analyse sans exécuter (descripteur avec paramètres liés).
    pub fn explain(&self, query: &str, params: &[Value]) -> Result<QueryDescriptor> {
        parse(query, params)
    }

    /// Exécute n'importe laquelle des quatre formes.
    pub async fn execute(&self, query: &str, params: &[Value]) -> Result<QueryOutcome> {
        self.engine().execute(parse(query, params)?).await
    }

    pub async fn read(&self, query: &str, params: &[Value]) -> Result<Vec<Record>> {
        match self.prepare(query, params, QueryKind::Read)? {
            QueryDescriptor::Read(q) => self.engine().read(q).await,
            _ => Err(AppError::parse(query, "SELECT attendu")),
        }
    }

    /// Renvoie le substitut du document créé.
    pub async fn insert(&self, query: &str, params: &[Value]) -> Result<u32> {
        match self.prepare(query, params, QueryKind::Insert)? {
            QueryDescriptor::Insert(q) => self.engine().insert(q).await,
            _ => Err(AppError::parse(query, "INSERT attendu")),
        }
    }

    /// Renvoie le nombre de documents modifiés.
    pub async fn update(&self, query: &str, params: &[Value]) -> Result<usize> {
        match self.prepare(query, params, QueryKind::Update)? {
            QueryDescriptor::Update(q) => self.engine().update(q).await,
            _ => Err(AppError::parse(query, "UPDATE attendu")),
        }
    }

    /// Renvoie le nombre de documents de premier niveau supprimés.
    pub async fn delete(&self, query: &str, params: &[Value]) -> Result<usize> {
        match self.prepare(query, params, QueryKind::Delete)? {
            QueryDescriptor::Delete(q) => self.engine().delete(q).await,
            _ => Err(AppError::parse(query, "DELETE attendu")),
        }
    }

    /// Lecture typée : la requête doit viser la collection de `T`.
    pub async fn read_as<T: CollectionRecord>(&self, query: &str, params: &[Value]) -> Result<Vec<T>> {
        let descriptor = self.prepare(query, params, QueryKind::Read)?;
        if descriptor.collection() != T::COLLECTION {
            return Err(AppError::parse(
                query,
                format!(
                    "collection '{}' lue comme '{}'",
                    descriptor.collection(),
                    T::COLLECTION
                ),
            ));
        }
        let QueryDescriptor::Read(q) = descriptor else {
            return Err(AppError::parse(query, "SELECT attendu"));
        };
        self.engine()
            .read(q)
            .await?
            .into_iter()
            .map(T::from_record)
            .collect()
    }

    pub fn surrogate_of(&self, native_id: &str) -> u32 {
        self.translator.surrogate(native_id)
    }

    pub async fn native_of(&self, surrogate: u32, collection: &str) -> Result<Option<String>> {
        self.translator
            .native_of(self.store(), collection, surrogate)
            .await
    }
}
