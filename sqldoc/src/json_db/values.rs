// FICHIER : sqldoc/src/json_db/values.rs

//! Valeurs "natives" du magasin : encodage des dates, analyse des horodatages,
//! comparaisons inter-types et normalisation des documents en lignes plates.

use crate::json_db::identity::surrogate_of;
use crate::json_db::storage::{Document, ID_FIELD};
use crate::utils::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// Ligne plate renvoyée aux appelants.
pub type Record = Map<String, Value>;

/// Clé d'encodage d'une date native : `{"$date": "<rfc3339>"}`.
pub const DATE_KEY: &str = "$date";

/// Champ annexe conservant l'identifiant natif brut dans une ligne normalisée.
///
/// Remplace l'ancien nom `_object_id`, qui n'est plus ni produit ni reconnu :
/// `SELECT _object_id FROM …` ne renvoie que `id` et `_native_id`. Les
/// appelants qui projetaient `_object_id` doivent lire `_native_id`.
pub const NATIVE_ID_FIELD: &str = "_native_id";

/// Champ de l'identifiant de substitution dans une ligne normalisée.
pub const SURROGATE_FIELD: &str = "id";

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Jeton SQL (et valeur liée) signifiant "heure courante du serveur".
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

pub fn iso_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn date_value(dt: DateTime<Utc>) -> Value {
    json!({ DATE_KEY: iso_string(dt) })
}

/// Décode une date native. Tout autre objet renvoie `None`.
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    let raw = map.get(DATE_KEY)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Analyse ISO-8601 tolérante : avec fuseau, naïf (interprété en UTC),
/// séparateur `T` ou espace, ou date seule.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Un champ est un horodatage par convention de nommage.
pub fn is_timestamp_field(field: &str) -> bool {
    field.ends_with("_at")
}

/// Convertit une chaîne affectée à un champ `*_at` en date native.
pub fn coerce_timestamp(
    field: &str,
    raw: &str,
    policy: TimestampPolicy,
    now: DateTime<Utc>,
) -> Result<Value> {
    if raw.trim().eq_ignore_ascii_case(CURRENT_TIMESTAMP) {
        return Ok(date_value(now));
    }
    match parse_timestamp(raw) {
        Some(dt) => Ok(date_value(dt)),
        None => match policy {
            TimestampPolicy::Strict => Err(AppError::InvalidTimestamp {
                field: field.to_string(),
                value: raw.to_string(),
            }),
            TimestampPolicy::Lenient => {
                warn!(
                    "⚠️ Horodatage illisible pour '{}' ({:?}), remplacé par l'heure courante",
                    field, raw
                );
                Ok(date_value(now))
            }
        },
    }
}

// --- COMPARAISONS ---

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(v @ Value::Object(_)) if as_date(v).is_some() => 6,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn same_rank_cmp(a: &Value, b: &Value) -> Ordering {
    if let (Some(d1), Some(d2)) = (as_date(a), as_date(b)) {
        return d1.cmp(&d2);
    }
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => {
            let (f1, f2) = (n1.as_f64().unwrap_or(0.0), n2.as_f64().unwrap_or(0.0));
            f1.partial_cmp(&f2).unwrap_or(Ordering::Equal)
        }
        (Value::String(s1), Value::String(s2)) => s1.cmp(s2),
        (Value::Bool(b1), Value::Bool(b2)) => b1.cmp(b2),
        (Value::Array(x), Value::Array(y)) => {
            for (v1, v2) in x.iter().zip(y.iter()) {
                let cmp = compare_for_sort(Some(v1), Some(v2));
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Ordre total utilisé par ORDER BY (les valeurs absentes passent en tête).
pub fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(v1), Some(v2)) => same_rank_cmp(v1, v2),
        _ => Ordering::Equal,
    }
}

// Une chaîne lisible comme date est promue en date face à une date stockée.
fn promote<'v>(doc: &Value, target: &'v Value) -> Option<std::borrow::Cow<'v, Value>> {
    use std::borrow::Cow;
    if as_date(doc).is_some() {
        if let Value::String(s) = target {
            return parse_timestamp(s).map(|dt| Cow::Owned(date_value(dt)));
        }
    }
    Some(Cow::Borrowed(target))
}

/// Comparaison d'ordre pour `>`, `<`, `>=`, `<=` : `None` si les types diffèrent.
pub fn compare_values(doc: Option<&Value>, target: &Value) -> Option<Ordering> {
    let doc = doc?;
    if doc.is_null() || target.is_null() {
        return None;
    }
    let target = promote(doc, target)?;
    if type_rank(Some(doc)) != type_rank(Some(&target)) {
        return None;
    }
    Some(same_rank_cmp(doc, &target))
}

/// Égalité pour `=` et `!=`. L'égalité avec `null` accepte un champ absent.
pub fn values_equal(doc: Option<&Value>, target: &Value) -> bool {
    match doc {
        None | Some(Value::Null) => target.is_null(),
        Some(v) => {
            if target.is_null() {
                return false;
            }
            match compare_values(Some(v), target) {
                Some(ord) => ord == Ordering::Equal,
                None => v == target,
            }
        }
    }
}

// --- NORMALISATION ---

fn normalize_value(value: &Value) -> Value {
    if let Some(dt) = as_date(value) {
        return Value::String(iso_string(dt));
    }
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

/// Transforme un document stocké en ligne plate : `_id` devient `id`
/// (substitution) + `_native_id`, les dates deviennent des chaînes ISO-8601.
pub fn normalize_document(doc: &Document) -> Record {
    let mut record = Record::new();
    if let Some(native) = doc.get(ID_FIELD).and_then(Value::as_str) {
        record.insert(SURROGATE_FIELD.to_string(), json!(surrogate_of(native)));
        record.insert(NATIVE_ID_FIELD.to_string(), json!(native));
    }
    for (key, value) in doc {
        if key == ID_FIELD {
            continue;
        }
        record.insert(key.clone(), normalize_value(value));
    }
    record
}
