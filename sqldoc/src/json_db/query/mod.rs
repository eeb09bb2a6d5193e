// FICHIER : sqldoc/src/json_db/query/mod.rs

//! Descripteurs de requêtes : forme structurée, éphémère, d'une requête SQL
//! du dialecte restreint, prête à être exécutée sur le magasin.

use serde::Serialize;
use serde_json::Value;

pub mod cascade;
pub mod executor;
pub mod parser;

pub use executor::{QueryEngine, QueryOutcome};
pub use parser::{parse, ParamCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Read,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryDescriptor {
    Read(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

impl QueryDescriptor {
    pub fn kind(&self) -> QueryKind {
        match self {
            QueryDescriptor::Read(_) => QueryKind::Read,
            QueryDescriptor::Insert(_) => QueryKind::Insert,
            QueryDescriptor::Update(_) => QueryKind::Update,
            QueryDescriptor::Delete(_) => QueryKind::Delete,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            QueryDescriptor::Read(q) => &q.collection,
            QueryDescriptor::Insert(q) => &q.collection,
            QueryDescriptor::Update(q) => &q.collection,
            QueryDescriptor::Delete(q) => &q.collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectQuery {
    pub collection: String,
    pub projection: Projection,
    pub filter: QueryFilter,
    pub sort: Vec<SortField>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    All,
    Fields(Vec<String>),
    /// `COUNT(*)` ou `COUNT(DISTINCT champ)`, rendu sous `alias`.
    Count {
        alias: String,
        distinct: Option<String>,
    },
}

/// Conjonction de conditions (AND uniquement).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryFilter {
    pub conditions: Vec<Condition>,
}

impl QueryFilter {
    /// Un identifiant non résolu force un résultat vide, quel que soit l'opérateur.
    pub fn is_unresolved(&self) -> bool {
        self.conditions.iter().any(|c| {
            matches!(
                c,
                Condition::Id {
                    target: IdTarget::Unresolved(_),
                    ..
                }
            )
        })
    }

    /// Identifiant natif ciblé par une condition `id = ?` résolue.
    pub fn native_target(&self) -> Option<&str> {
        self.conditions.iter().find_map(|c| match c {
            Condition::Id {
                operator: ComparisonOperator::Eq,
                target: IdTarget::Native(id),
            } => Some(id.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    Field {
        field: String,
        operator: ComparisonOperator,
        value: Value,
    },
    /// Condition sur `id` : identifiant natif, substitut, ou marqueur "non résolu".
    Id {
        operator: ComparisonOperator,
        target: IdTarget,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdTarget {
    Native(String),
    Surrogate(u32),
    Unresolved(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertQuery {
    pub collection: String,
    pub columns: Vec<String>,
    pub values: Vec<ValueExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateQuery {
    pub collection: String,
    pub assignments: Vec<Assignment>,
    pub filter: QueryFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub field: String,
    pub value: ValueExpr,
}

/// Valeur affectée : paramètre lié, littéral typé, ou heure courante.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    Param(Value),
    Literal(Value),
    CurrentTimestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteQuery {
    pub collection: String,
    pub filter: QueryFilter,
}
