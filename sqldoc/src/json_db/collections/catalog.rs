// FICHIER : sqldoc/src/json_db/collections/catalog.rs

//! Catalogue déclaratif : collections connues, indications d'index et
//! relations parent -> enfant suivies par la suppression en cascade.

use serde::{Deserialize, Serialize};

/// Indication d'index. Purement indicative (performance), jamais un contrat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHint {
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexHint {
    pub fn on(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(fields: &[&str]) -> Self {
        Self {
            unique: true,
            ..Self::on(fields)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub indexes: Vec<IndexHint>,
}

/// Relation `parent` -> `child` : les enfants référencent le parent via
/// `foreign_key` (identifiant natif ou substitut, selon l'historique).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeRule {
    pub parent: String,
    pub child: String,
    pub foreign_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCatalog {
    pub collections: Vec<CollectionSpec>,
    pub cascades: Vec<CascadeRule>,
}

impl Default for CollectionCatalog {
    fn default() -> Self {
        Self::content_pipeline()
    }
}

impl CollectionCatalog {
    pub fn empty() -> Self {
        Self {
            collections: Vec::new(),
            cascades: Vec::new(),
        }
    }

    pub fn with_collection(mut self, name: &str, indexes: Vec<IndexHint>) -> Self {
        self.collections.push(CollectionSpec {
            name: name.to_string(),
            indexes,
        });
        self
    }

    pub fn with_cascade(mut self, parent: &str, child: &str, foreign_key: &str) -> Self {
        self.cascades.push(CascadeRule {
            parent: parent.to_string(),
            child: child.to_string(),
            foreign_key: foreign_key.to_string(),
        });
        self
    }

    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a CascadeRule> + 'a {
        self.cascades.iter().filter(move |r| r.parent == parent)
    }

    pub fn get(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Catalogue du pipeline de contenu (blog -> scripts -> vidéos -> posts).
    pub fn content_pipeline() -> Self {
        use IndexHint as I;
        Self::empty()
            .with_collection("workflows", vec![I::on(&["is_active"]), I::on(&["name"])])
            .with_collection(
                "pipeline_stages",
                vec![I::on(&["workflow_id"]), I::on(&["workflow_id", "stage_order"])],
            )
            .with_collection(
                "workflow_instances",
                vec![I::on(&["workflow_id"]), I::on(&["status"]), I::on(&["created_at"])],
            )
            .with_collection(
                "task_executions",
                vec![
                    I::on(&["workflow_instance_id"]),
                    I::on(&["status"]),
                    I::on(&["pipeline_stage_id"]),
                ],
            )
            .with_collection(
                "automation_rules",
                vec![I::on(&["workflow_id"]), I::on(&["is_active"])],
            )
            .with_collection(
                "data_records",
                vec![
                    I::on(&["record_type"]),
                    I::on(&["workflow_instance_id"]),
                    I::unique(&["record_type", "record_key"]),
                ],
            )
            .with_collection(
                "workflow_logs",
                vec![
                    I::on(&["workflow_instance_id"]),
                    I::on(&["task_execution_id"]),
                    I::on(&["created_at"]),
                ],
            )
            .with_collection("users", vec![I::unique(&["email"]), I::on(&["is_active"])])
            .with_collection(
                "blog_urls",
                vec![I::on(&["status"]), I::unique(&["url"]), I::on(&["created_at"])],
            )
            .with_collection(
                "scripts",
                vec![
                    I::on(&["blog_url_id"]),
                    I::on(&["status"]),
                    I::on(&["blog_url_id", "script_number"]),
                    I::on(&["created_at"]),
                ],
            )
            .with_collection(
                "videos",
                vec![I::on(&["script_id"]), I::on(&["status"]), I::on(&["created_at"])],
            )
            .with_collection(
                "social_media_posts",
                vec![
                    I::on(&["video_id"]),
                    I::on(&["platform"]),
                    I::unique(&["video_id", "platform"]),
                ],
            )
            .with_collection(
                "uploaded_videos",
                vec![I::on(&["created_at"]), I::on(&["title"])],
            )
            .with_collection(
                "reimaginehome_tv_uploads",
                vec![I::on(&["video_id"]), I::on(&["status"])],
            )
            .with_collection("youtube_upload_tracking", vec![I::unique(&["upload_date"])])
            .with_collection("master_prompts", vec![I::on(&["is_active"]), I::on(&["name"])])
            .with_cascade("blog_urls", "scripts", "blog_url_id")
            .with_cascade("scripts", "videos", "script_id")
            .with_cascade("videos", "social_media_posts", "video_id")
    }
}
