// FICHIER : sqldoc/src/json_db/query/parser.rs

use crate::json_db::identity::{canonical_native, surrogate_from_value};
use crate::json_db::query::{
    Assignment, ComparisonOperator, Condition, DeleteQuery, IdTarget, InsertQuery, Projection,
    QueryDescriptor, QueryFilter, SelectQuery, SortField, SortOrder, UpdateQuery, ValueExpr,
};
use crate::json_db::storage::ID_FIELD;
use crate::json_db::values::{NATIVE_ID_FIELD, SURROGATE_FIELD};
use crate::utils::{AppError, Result};
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use serde_json::{Number, Value};
use std::collections::HashSet;

#[derive(Parser)]
#[grammar = "json_db/query/grammar.pest"]
pub struct SqlParser;

const STATEMENTS: [&str; 4] = ["select", "insert", "update", "delete"];

/// Alias de projection par défaut pour `COUNT(...)` sans `AS`.
pub const DEFAULT_COUNT_ALIAS: &str = "count";

// --- PARAMÈTRES POSITIONNELS ---

/// Consomme les paramètres liés de gauche à droite, dans l'ordre des `?`
/// dans le texte de la requête.
pub struct ParamCursor<'q> {
    query: &'q str,
    params: &'q [Value],
    next: usize,
}

impl<'q> ParamCursor<'q> {
    pub fn new(query: &'q str, params: &'q [Value]) -> Self {
        Self {
            query,
            params,
            next: 0,
        }
    }

    pub fn take(&mut self) -> Result<Value> {
        let value = self.params.get(self.next).cloned().ok_or_else(|| {
            AppError::parse(
                self.query,
                format!(
                    "paramètre manquant pour le placeholder n°{} ({} fourni(s))",
                    self.next + 1,
                    self.params.len()
                ),
            )
        })?;
        self.next += 1;
        Ok(value)
    }

    /// Échoue si des paramètres n'ont été consommés par aucun placeholder.
    pub fn finish(self) -> Result<()> {
        if self.next < self.params.len() {
            return Err(AppError::parse(
                self.query,
                format!(
                    "trop de paramètres : {} fourni(s), {} placeholder(s)",
                    self.params.len(),
                    self.next
                ),
            ));
        }
        Ok(())
    }
}

// --- POINT D'ENTRÉE ---

/// Analyse une requête du dialecte et lie ses paramètres positionnels.
pub fn parse(query: &str, params: &[Value]) -> Result<QueryDescriptor> {
    check_statement_kind(query)?;

    let statement = SqlParser::parse(Rule::statement, query)
        .map_err(|e| syntax_error(query, &e))?
        .next()
        .ok_or_else(|| AppError::parse(query, "requête vide"))?;

    let mut mapper = Mapper {
        query,
        cursor: ParamCursor::new(query, params),
    };
    let descriptor = mapper.statement(statement)?;
    mapper.cursor.finish()?;
    Ok(descriptor)
}

/// Toute forme qui ne commence pas par l'un des quatre verbes est
/// `UnsupportedQuery` ; seule une requête vide est une erreur d'analyse.
fn check_statement_kind(query: &str) -> Result<()> {
    let trimmed = query.trim_start();
    if trimmed.is_empty() {
        return Err(AppError::parse(query, "requête vide"));
    }
    let first: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if !STATEMENTS.contains(&first.to_ascii_lowercase().as_str()) {
        return Err(AppError::UnsupportedQuery(query.trim().to_string()));
    }
    Ok(())
}

fn syntax_error(query: &str, e: &pest::error::Error<Rule>) -> AppError {
    let (line, col) = match e.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    AppError::parse(
        query,
        format!(
            "syntaxe invalide (ligne {}, colonne {}) : {}",
            line,
            col,
            e.variant.message()
        ),
    )
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_select
            | Rule::kw_from
            | Rule::kw_where
            | Rule::kw_and
            | Rule::kw_or
            | Rule::kw_order
            | Rule::kw_by
            | Rule::kw_limit
            | Rule::kw_insert
            | Rule::kw_into
            | Rule::kw_values
            | Rule::kw_update
            | Rule::kw_set
            | Rule::kw_delete
            | Rule::kw_as
            | Rule::kw_count
            | Rule::kw_distinct
            | Rule::kw_join
            | Rule::kw_inner
            | Rule::kw_left
            | Rule::kw_on
            | Rule::kw_asc
            | Rule::kw_desc
    )
}

fn significant(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

/// Nom de champ d'une référence `[alias.]champ` (le préfixe d'alias est retiré).
fn field_name(pair: Pair<'_, Rule>) -> String {
    let raw = pair.as_str();
    pair.into_inner()
        .last()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn is_id_field(field: &str) -> bool {
    field == SURROGATE_FIELD || field == NATIVE_ID_FIELD || field == ID_FIELD
}

/// Interprète la valeur liée à `id` : identifiant natif, substitut, ou non résolu.
pub fn id_target(value: &Value) -> IdTarget {
    if let Some(native) = value.as_str().and_then(canonical_native) {
        return IdTarget::Native(native);
    }
    match surrogate_from_value(value) {
        Some(n) => IdTarget::Surrogate(n),
        None => IdTarget::Unresolved(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    }
}

// --- CONSTRUCTION DU DESCRIPTEUR ---

struct Mapper<'q> {
    query: &'q str,
    cursor: ParamCursor<'q>,
}

impl<'q> Mapper<'q> {
    fn err(&self, message: impl Into<String>) -> AppError {
        AppError::parse(self.query, message)
    }

    fn statement(&mut self, pair: Pair<'_, Rule>) -> Result<QueryDescriptor> {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::select_stmt => return self.select(inner).map(QueryDescriptor::Read),
                Rule::insert_stmt => return self.insert(inner).map(QueryDescriptor::Insert),
                Rule::update_stmt => return self.update(inner).map(QueryDescriptor::Update),
                Rule::delete_stmt => return self.delete(inner).map(QueryDescriptor::Delete),
                _ => {}
            }
        }
        Err(self.err("instruction introuvable"))
    }

    fn select(&mut self, pair: Pair<'_, Rule>) -> Result<SelectQuery> {
        let mut collection = None;
        let mut projection = Projection::All;
        let mut filter = QueryFilter::default();
        let mut sort = Vec::new();
        let mut limit = None;

        for p in significant(pair) {
            match p.as_rule() {
                Rule::projection => projection = self.projection(p)?,
                Rule::table_ref => collection = Some(self.table_ref(p)?),
                Rule::join_clause => {
                    return Err(self.err("les jointures (JOIN) ne sont pas supportées"))
                }
                Rule::where_clause => filter = self.where_clause(p)?,
                Rule::order_clause => sort = self.order_clause(p),
                Rule::limit_clause => limit = Some(self.limit_clause(p)?),
                _ => {}
            }
        }

        Ok(SelectQuery {
            collection: collection.ok_or_else(|| self.err("nom de collection introuvable"))?,
            projection,
            filter,
            sort,
            limit,
        })
    }

    fn insert(&mut self, pair: Pair<'_, Rule>) -> Result<InsertQuery> {
        let mut collection = None;
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for p in significant(pair) {
            match p.as_rule() {
                Rule::ident => collection = Some(p.as_str().to_string()),
                Rule::column_list => {
                    let mut seen = HashSet::new();
                    for col in p.into_inner() {
                        let name = col.as_str().to_string();
                        if !seen.insert(name.clone()) {
                            return Err(self.err(format!("colonne dupliquée : {}", name)));
                        }
                        columns.push(name);
                    }
                }
                Rule::value_list => {
                    for v in p.into_inner() {
                        values.push(self.value_expr(v)?);
                    }
                }
                _ => {}
            }
        }

        if columns.len() != values.len() {
            return Err(self.err(format!(
                "{} colonne(s) pour {} valeur(s)",
                columns.len(),
                values.len()
            )));
        }

        Ok(InsertQuery {
            collection: collection.ok_or_else(|| self.err("nom de collection introuvable"))?,
            columns,
            values,
        })
    }

    fn update(&mut self, pair: Pair<'_, Rule>) -> Result<UpdateQuery> {
        let mut collection = None;
        let mut assignments = Vec::new();
        let mut filter = QueryFilter::default();

        for p in significant(pair) {
            match p.as_rule() {
                Rule::table_ref => collection = Some(self.table_ref(p)?),
                Rule::assignment => assignments.push(self.assignment(p)?),
                Rule::where_clause => filter = self.where_clause(p)?,
                _ => {}
            }
        }

        if assignments.is_empty() {
            return Err(self.err("clause SET absente"));
        }

        Ok(UpdateQuery {
            collection: collection.ok_or_else(|| self.err("nom de collection introuvable"))?,
            assignments,
            filter,
        })
    }

    fn delete(&mut self, pair: Pair<'_, Rule>) -> Result<DeleteQuery> {
        let mut collection = None;
        let mut filter = QueryFilter::default();

        for p in significant(pair) {
            match p.as_rule() {
                Rule::table_ref => collection = Some(self.table_ref(p)?),
                Rule::where_clause => filter = self.where_clause(p)?,
                _ => {}
            }
        }

        Ok(DeleteQuery {
            collection: collection.ok_or_else(|| self.err("nom de collection introuvable"))?,
            filter,
        })
    }

    // --- CLAUSES ---

    fn table_ref(&self, pair: Pair<'_, Rule>) -> Result<String> {
        pair.into_inner()
            .find(|p| p.as_rule() == Rule::ident)
            .map(|p| p.as_str().to_string())
            .ok_or_else(|| self.err("nom de collection introuvable"))
    }

    fn projection(&self, pair: Pair<'_, Rule>) -> Result<Projection> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| self.err("projection vide"))?;
        match inner.as_rule() {
            Rule::star | Rule::qualified_star => Ok(Projection::All),
            Rule::field_list => Ok(Projection::Fields(inner.into_inner().map(field_name).collect())),
            Rule::count_expr => {
                let mut alias = DEFAULT_COUNT_ALIAS.to_string();
                let mut distinct = None;
                for p in significant(inner) {
                    match p.as_rule() {
                        Rule::count_distinct => {
                            distinct = significant(p).next().map(field_name);
                        }
                        Rule::count_alias => {
                            if let Some(id) = significant(p).next() {
                                alias = id.as_str().to_string();
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Projection::Count { alias, distinct })
            }
            _ => Err(self.err("projection non reconnue")),
        }
    }

    fn where_clause(&mut self, pair: Pair<'_, Rule>) -> Result<QueryFilter> {
        let mut conditions = Vec::new();
        for p in significant(pair) {
            match p.as_rule() {
                Rule::logical_op => {
                    if p.as_str().eq_ignore_ascii_case("or") {
                        return Err(self.err(
                            "OR n'est pas supporté : les conditions sont combinées par AND uniquement",
                        ));
                    }
                }
                Rule::condition => conditions.push(self.condition(p)?),
                _ => {}
            }
        }
        Ok(QueryFilter { conditions })
    }

    fn condition(&mut self, pair: Pair<'_, Rule>) -> Result<Condition> {
        let mut inner = pair.into_inner();
        let (Some(field), Some(op), Some(value)) = (inner.next(), inner.next(), inner.next()) else {
            return Err(self.err("condition incomplète"));
        };

        let field = field_name(field);
        let operator = ComparisonOperator::from_symbol(op.as_str())
            .ok_or_else(|| self.err(format!("opérateur inconnu : {}", op.as_str())))?;
        let value = match self.value_expr(value)? {
            ValueExpr::Param(v) => v,
            _ => {
                return Err(self.err(format!(
                    "condition sur '{}' : seule la forme `champ OP ?` est acceptée",
                    field
                )))
            }
        };

        if !is_id_field(&field) {
            return Ok(Condition::Field {
                field,
                operator,
                value,
            });
        }

        if !matches!(operator, ComparisonOperator::Eq | ComparisonOperator::Ne) {
            return Err(self.err(format!(
                "seuls = et != sont acceptés sur '{}'",
                field
            )));
        }
        let target = if field == SURROGATE_FIELD {
            id_target(&value)
        } else {
            // `_native_id` / `_id` : identifiant natif fourni tel quel
            match value {
                Value::String(s) => IdTarget::Native(canonical_native(&s).unwrap_or(s)),
                other => IdTarget::Unresolved(other.to_string()),
            }
        };
        Ok(Condition::Id { operator, target })
    }

    fn order_clause(&self, pair: Pair<'_, Rule>) -> Vec<SortField> {
        significant(pair)
            .filter(|p| p.as_rule() == Rule::order_term)
            .filter_map(|term| {
                let mut inner = term.into_inner();
                let field = inner.next().map(field_name)?;
                let order = match inner.next() {
                    Some(dir) if dir.as_str().eq_ignore_ascii_case("desc") => SortOrder::Desc,
                    _ => SortOrder::Asc,
                };
                Some(SortField { field, order })
            })
            .collect()
    }

    fn limit_clause(&mut self, pair: Pair<'_, Rule>) -> Result<usize> {
        let inner = significant(pair)
            .next()
            .ok_or_else(|| self.err("LIMIT sans valeur"))?;
        match inner.as_rule() {
            Rule::integer => inner
                .as_str()
                .parse::<usize>()
                .map_err(|_| self.err(format!("LIMIT invalide : {}", inner.as_str()))),
            _ => {
                let value = self.cursor.take()?;
                value
                    .as_u64()
                    .map(|n| n as usize)
                    .ok_or_else(|| self.err(format!("LIMIT invalide : {}", value)))
            }
        }
    }

    fn assignment(&mut self, pair: Pair<'_, Rule>) -> Result<Assignment> {
        let mut inner = pair.into_inner();
        let (Some(field), Some(value)) = (inner.next(), inner.next()) else {
            return Err(self.err("affectation incomplète"));
        };
        let field = field_name(field);
        if is_id_field(&field) {
            return Err(self.err(format!("l'identifiant '{}' ne peut pas être modifié", field)));
        }
        Ok(Assignment {
            field,
            value: self.value_expr(value)?,
        })
    }

    // --- VALEURS ---

    fn value_expr(&mut self, pair: Pair<'_, Rule>) -> Result<ValueExpr> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| self.err("valeur absente"))?;
        match inner.as_rule() {
            Rule::placeholder => Ok(ValueExpr::Param(self.cursor.take()?)),
            Rule::current_ts => Ok(ValueExpr::CurrentTimestamp),
            Rule::literal => Ok(ValueExpr::Literal(self.literal(inner)?)),
            _ => Err(self.err(format!("valeur non reconnue : {}", inner.as_str()))),
        }
    }

    fn literal(&self, pair: Pair<'_, Rule>) -> Result<Value> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| self.err("littéral vide"))?;
        match inner.as_rule() {
            Rule::string => {
                let quoted = inner.as_str();
                let body = inner
                    .into_inner()
                    .next()
                    .map(|p| p.as_str())
                    .unwrap_or_default();
                let text = if quoted.starts_with('\'') {
                    body.replace("''", "'")
                } else {
                    body.replace("\"\"", "\"")
                };
                Ok(Value::String(text))
            }
            Rule::number => {
                let raw = inner.as_str();
                if let Ok(i) = raw.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| self.err(format!("nombre invalide : {}", raw)))
            }
            Rule::boolean => Ok(Value::Bool(inner.as_str().eq_ignore_ascii_case("true"))),
            Rule::null_lit => Ok(Value::Null),
            _ => Err(self.err(format!("littéral non reconnu : {}", inner.as_str()))),
        }
    }
}
