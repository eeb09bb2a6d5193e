// FICHIER : sqldoc/src/json_db/records.rs

//! Types de lignes par collection : accès typé aux champs conventionnels,
//! le magasin restant sans schéma.

use crate::json_db::values::Record;
use crate::utils::prelude::*;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Une ligne normalisée d'une collection connue.
pub trait CollectionRecord: DeserializeOwned {
    const COLLECTION: &'static str;

    fn from_record(record: Record) -> Result<Self> {
        serde_json::from_value(Value::Object(record)).map_err(AppError::from)
    }
}

/// Clé étrangère telle qu'écrite au fil de l'historique : substitut
/// (entier ou chaîne numérique) ou identifiant natif.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForeignKey {
    Surrogate(u64),
    Native(String),
}

impl ForeignKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(ForeignKey::Surrogate),
            Value::String(s) if !s.is_empty() => Some(ForeignKey::Native(s.clone())),
            _ => None,
        }
    }

    /// Vrai si la clé désigne le document `native_id` (de substitut `surrogate`).
    pub fn refers_to(&self, native_id: &str, surrogate: u32) -> bool {
        match self {
            ForeignKey::Surrogate(n) => *n == surrogate as u64,
            ForeignKey::Native(s) => {
                s == native_id || s.trim().parse::<u64>().ok() == Some(surrogate as u64)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlogUrl {
    pub id: u32,
    #[serde(rename = "_native_id")]
    pub native_id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRecord for BlogUrl {
    const COLLECTION: &'static str = "blog_urls";
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Script {
    pub id: u32,
    #[serde(rename = "_native_id")]
    pub native_id: String,
    pub blog_url_id: Option<ForeignKey>,
    pub script_number: Option<i64>,
    pub script_content: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub category: Option<String>,
    pub youtube_title: Option<String>,
    pub youtube_description: Option<String>,
    pub youtube_keywords: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
    pub video_url: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub input_cost: Option<f64>,
    pub output_cost: Option<f64>,
    pub total_cost: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRecord for Script {
    const COLLECTION: &'static str = "scripts";
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Video {
    pub id: u32,
    #[serde(rename = "_native_id")]
    pub native_id: String,
    pub script_id: Option<ForeignKey>,
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRecord for Video {
    const COLLECTION: &'static str = "videos";
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SocialMediaPost {
    pub id: u32,
    #[serde(rename = "_native_id")]
    pub native_id: String,
    pub video_id: Option<ForeignKey>,
    pub platform: Option<String>,
    pub post_url: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRecord for SocialMediaPost {
    const COLLECTION: &'static str = "social_media_posts";
}
