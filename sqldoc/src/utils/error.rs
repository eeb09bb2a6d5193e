// FICHIER : sqldoc/src/utils/error.rs

use serde::Serialize;
use std::io;

// --- GESTION D'ERREUR STRICTE ---

/// Type de résultat standard de la couche de traduction.
pub type Result<T> = std::result::Result<T, AppError>;

/// Enumération centrale des erreurs.
/// Les erreurs de parsing portent toujours le texte de la requête fautive.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Erreur de parsing SQL : {message} (requête : {query})")]
    Parse { query: String, message: String },

    #[error("Requête non supportée : {0}")]
    UnsupportedQuery(String),

    #[error("Erreur de connexion au magasin : {0}")]
    StoreConnection(String),

    #[error("Horodatage invalide pour '{field}' : {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Identifiant invalide : {0}")]
    InvalidIdentifier(String),

    #[error("Identifiant déjà présent dans '{collection}' : {id}")]
    DuplicateId { collection: String, id: String },

    #[error("Erreur de configuration : {0}")]
    Config(String),

    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] io::Error),

    #[error("Erreur de sérialisation : {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erreur Système : {0}")]
    System(#[from] anyhow::Error),
}

impl AppError {
    pub fn parse(query: &str, message: impl Into<String>) -> Self {
        AppError::Parse {
            query: query.to_string(),
            message: message.into(),
        }
    }

    /// Vrai pour les échecs d'accès au magasin (par opposition aux erreurs de requête).
    pub fn is_connection(&self) -> bool {
        matches!(self, AppError::StoreConnection(_) | AppError::Io(_))
    }
}

// Sérialisation en simple chaîne (pour les sorties JSON du CLI).
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

// Permet de faire : return Err("Mon erreur".into());
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::System(anyhow::anyhow!(s))
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::System(anyhow::anyhow!(s.to_string()))
    }
}
