// FICHIER : sqldoc/src/json_db/query/executor.rs

use crate::utils::prelude::*;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::json_db::collections::CollectionCatalog;
use crate::json_db::identity::{canonical_native, IdentifierTranslator};
use crate::json_db::query::cascade::CascadeDeleter;
use crate::json_db::query::{
    ComparisonOperator, Condition, DeleteQuery, IdTarget, InsertQuery, Projection,
    QueryDescriptor, QueryFilter, SelectQuery, SortField, SortOrder, UpdateQuery, ValueExpr,
};
use crate::json_db::storage::{Document, DocumentStore, ID_FIELD};
use crate::json_db::values::{
    self, coerce_timestamp, compare_for_sort, date_value, is_timestamp_field, normalize_document,
    Record, CREATED_AT, NATIVE_ID_FIELD, SURROGATE_FIELD, UPDATED_AT,
};

/// Résultat d'une exécution, selon le type de requête.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOutcome {
    Rows(Vec<Record>),
    Inserted(u32),
    Affected(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Update,
}

// --- MOTEUR DE REQUÊTE ---

pub struct QueryEngine<'a> {
    store: &'a dyn DocumentStore,
    catalog: &'a CollectionCatalog,
    translator: &'a IdentifierTranslator,
    policy: TimestampPolicy,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        catalog: &'a CollectionCatalog,
        translator: &'a IdentifierTranslator,
    ) -> Self {
        Self {
            store,
            catalog,
            translator,
            policy: TimestampPolicy::default(),
        }
    }

    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn execute(&self, descriptor: QueryDescriptor) -> Result<QueryOutcome> {
        match descriptor {
            QueryDescriptor::Read(q) => self.read(q).await.map(QueryOutcome::Rows),
            QueryDescriptor::Insert(q) => self.insert(q).await.map(QueryOutcome::Inserted),
            QueryDescriptor::Update(q) => self.update(q).await.map(QueryOutcome::Affected),
            QueryDescriptor::Delete(q) => self.delete(q).await.map(QueryOutcome::Affected),
        }
    }

    // --- LECTURE ---

    /// Filtre -> tri -> limite -> normalisation (ou comptage).
    #[instrument(skip_all, fields(collection = %q.collection))]
    pub async fn read(&self, q: SelectQuery) -> Result<Vec<Record>> {
        let filter = self.bind_filter(&q.collection, q.filter).await?;

        if let Projection::Count { alias, distinct } = &q.projection {
            let docs = self.select_targets(&q.collection, &filter).await?;
            let total = match distinct {
                None => docs.len(),
                Some(field) => docs
                    .iter()
                    .filter_map(|d| field_value(d, field))
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect::<HashSet<_>>()
                    .len(),
            };
            let mut row = Record::new();
            row.insert(alias.clone(), json!(total));
            return Ok(vec![row]);
        }

        let mut docs = self.select_targets(&q.collection, &filter).await?;
        if !q.sort.is_empty() {
            docs.sort_by(|a, b| compare_docs(a, b, &q.sort));
        }
        if let Some(limit) = q.limit {
            docs.truncate(limit);
        }

        let rows: Vec<Record> = docs
            .iter()
            .map(|d| project(normalize_document(d), &q.projection))
            .collect();
        debug!("🔎 {} ligne(s) renvoyée(s)", rows.len());
        Ok(rows)
    }

    // --- INSERTION ---

    /// Renvoie le substitut du document créé.
    #[instrument(skip_all, fields(collection = %q.collection))]
    pub async fn insert(&self, q: InsertQuery) -> Result<u32> {
        let now = Utc::now();
        let mut doc = Document::new();
        let mut native = None;

        for (column, expr) in q.columns.into_iter().zip(q.values) {
            let value = self.materialize(&column, expr, now, WriteMode::Insert)?;
            if column == SURROGATE_FIELD || column == ID_FIELD || column == NATIVE_ID_FIELD {
                native = requested_native_id(&column, value)?;
                continue;
            }
            doc.insert(column, value);
        }

        for field in [CREATED_AT, UPDATED_AT] {
            if doc.get(field).map_or(true, Value::is_null) {
                doc.insert(field.to_string(), date_value(now));
            }
        }

        let id = self.store.insert(&q.collection, native, doc).await?;
        let surrogate = self.translator.surrogate(&id);
        info!("➕ Document {} créé (substitut {})", id, surrogate);
        Ok(surrogate)
    }

    // --- MISE À JOUR ---

    /// Renvoie le nombre de documents réellement modifiés.
    #[instrument(skip_all, fields(collection = %q.collection))]
    pub async fn update(&self, q: UpdateQuery) -> Result<usize> {
        let now = Utc::now();
        // Valeurs calculées avant tout accès au magasin
        let changes = q
            .assignments
            .into_iter()
            .map(|a| {
                let value = self.materialize(&a.field, a.value, now, WriteMode::Update)?;
                Ok((a.field, value))
            })
            .collect::<Result<Vec<(String, Value)>>>()?;

        let filter = self.bind_filter(&q.collection, q.filter).await?;
        if filter.is_unresolved() {
            warn!("⚠️ UPDATE ignoré : identifiant non résolu dans '{}'", q.collection);
            return Ok(0);
        }

        let mut modified = 0;
        for mut doc in self.select_targets(&q.collection, &filter).await? {
            let Some(id) = doc.get(ID_FIELD).and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            let mut changed = false;
            for (field, value) in &changes {
                if doc.get(field) != Some(value) {
                    doc.insert(field.clone(), value.clone());
                    changed = true;
                }
            }
            if changed && self.store.replace(&q.collection, &id, doc).await? {
                modified += 1;
            }
        }
        info!("✏️ {} document(s) modifié(s)", modified);
        Ok(modified)
    }

    // --- SUPPRESSION ---

    /// Renvoie le nombre de documents de premier niveau supprimés (les enfants
    /// supprimés en cascade ne sont pas comptés).
    ///
    /// La cascade n'est pas transactionnelle : une panne en cours de route
    /// laisse les suppressions déjà effectuées en place.
    #[instrument(skip_all, fields(collection = %q.collection))]
    pub async fn delete(&self, q: DeleteQuery) -> Result<usize> {
        let filter = self.bind_filter(&q.collection, q.filter).await?;
        if filter.is_unresolved() {
            warn!("⚠️ DELETE ignoré : identifiant non résolu dans '{}'", q.collection);
            return Ok(0);
        }
        if filter.native_target().is_none() {
            warn!(
                "⚠️ DELETE refusé sur '{}' : un filtre `id = ?` explicite est requis",
                q.collection
            );
            return Ok(0);
        }

        let deleter = CascadeDeleter::new(self.store, self.catalog, self.translator);
        let mut deleted = 0;
        for doc in self.select_targets(&q.collection, &filter).await? {
            let Some(id) = doc.get(ID_FIELD).and_then(Value::as_str) else {
                continue;
            };
            let report = deleter.delete(&q.collection, id).await?;
            if report.deleted {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    // --- RÉSOLUTION & SÉLECTION ---

    /// Résout les substituts du filtre en identifiants natifs (ou en marqueur
    /// "non résolu").
    async fn bind_filter(&self, collection: &str, filter: QueryFilter) -> Result<QueryFilter> {
        let mut conditions = Vec::with_capacity(filter.conditions.len());
        for condition in filter.conditions {
            let bound = match condition {
                Condition::Id {
                    operator,
                    target: IdTarget::Surrogate(surrogate),
                } => {
                    let target = match self
                        .translator
                        .native_of(self.store, collection, surrogate)
                        .await?
                    {
                        Some(native) => IdTarget::Native(native),
                        None => {
                            debug!("❓ Substitut {} introuvable dans '{}'", surrogate, collection);
                            IdTarget::Unresolved(surrogate.to_string())
                        }
                    };
                    Condition::Id { operator, target }
                }
                other => other,
            };
            conditions.push(bound);
        }
        Ok(QueryFilter { conditions })
    }

    async fn select_targets(&self, collection: &str, filter: &QueryFilter) -> Result<Vec<Document>> {
        if filter.is_unresolved() {
            return Ok(Vec::new());
        }

        let candidates = match filter.native_target() {
            Some(native) => {
                debug!("⚡ Accès direct à {}/{}", collection, native);
                self.store.get(collection, native).await?.into_iter().collect()
            }
            None => {
                debug!("🐢 Scan complet de '{}'", collection);
                self.store.scan(collection).await?
            }
        };

        Ok(candidates
            .into_iter()
            .filter(|doc| matches_filter(doc, filter, self.translator))
            .collect())
    }

    fn materialize(
        &self,
        field: &str,
        expr: ValueExpr,
        now: DateTime<Utc>,
        mode: WriteMode,
    ) -> Result<Value> {
        let value = match expr {
            ValueExpr::CurrentTimestamp => return Ok(date_value(now)),
            ValueExpr::Param(v) | ValueExpr::Literal(v) => v,
        };
        if !is_timestamp_field(field) {
            return Ok(value);
        }
        match value {
            Value::Null if mode == WriteMode::Insert => Ok(date_value(now)),
            Value::String(s) => coerce_timestamp(field, &s, self.policy, now),
            other => Ok(other),
        }
    }
}

// --- ÉVALUATION ---

fn requested_native_id(column: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(canonical_native(&s).unwrap_or(s))),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(AppError::InvalidIdentifier(format!(
            "valeur non utilisable comme identifiant pour '{}' : {}",
            column, other
        ))),
    }
}

fn matches_filter(doc: &Document, filter: &QueryFilter, translator: &IdentifierTranslator) -> bool {
    filter.conditions.iter().all(|c| match c {
        Condition::Field {
            field,
            operator,
            value,
        } => evaluate(doc.get(field), *operator, value),
        Condition::Id { operator, target } => {
            let doc_id = doc.get(ID_FIELD).and_then(Value::as_str);
            let equal = match (target, doc_id) {
                (IdTarget::Native(n), Some(id)) => n == id,
                (IdTarget::Surrogate(s), Some(id)) => translator.surrogate(id) == *s,
                _ => return false,
            };
            match operator {
                ComparisonOperator::Ne => !equal,
                _ => equal,
            }
        }
    })
}

fn evaluate(doc_value: Option<&Value>, operator: ComparisonOperator, target: &Value) -> bool {
    match operator {
        ComparisonOperator::Eq => values::values_equal(doc_value, target),
        ComparisonOperator::Ne => !values::values_equal(doc_value, target),
        ComparisonOperator::Gt => values::compare_values(doc_value, target) == Some(Ordering::Greater),
        ComparisonOperator::Gte => matches!(
            values::compare_values(doc_value, target),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOperator::Lt => values::compare_values(doc_value, target) == Some(Ordering::Less),
        ComparisonOperator::Lte => matches!(
            values::compare_values(doc_value, target),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Valeur d'un champ, y compris les champs virtuels `id` et `_native_id`.
fn field_value<'d>(doc: &'d Document, field: &str) -> Option<Cow<'d, Value>> {
    match field {
        SURROGATE_FIELD => doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(|id| Cow::Owned(json!(crate::json_db::identity::surrogate_of(id)))),
        NATIVE_ID_FIELD => doc.get(ID_FIELD).map(Cow::Borrowed),
        _ => doc.get(field).map(Cow::Borrowed),
    }
}

fn compare_docs(a: &Document, b: &Document, sort: &[SortField]) -> Ordering {
    for s in sort {
        let va = field_value(a, &s.field);
        let vb = field_value(b, &s.field);
        let cmp = compare_for_sort(va.as_deref(), vb.as_deref());
        if cmp != Ordering::Equal {
            return match s.order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}

fn project(record: Record, projection: &Projection) -> Record {
    match projection {
        Projection::Fields(fields) => record
            .into_iter()
            .filter(|(k, _)| k == SURROGATE_FIELD || k == NATIVE_ID_FIELD || fields.contains(k))
            .collect(),
        _ => record,
    }
}

// ============================================================================
// TESTS UNITAIRES
// ============================================================================
