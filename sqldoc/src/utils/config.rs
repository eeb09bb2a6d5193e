// FICHIER : sqldoc/src/utils/config.rs

use crate::utils::env;
use crate::utils::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Variable désignant un fichier de configuration JSON.
pub const CONFIG_FILE_VAR: &str = "SQLDOC_CONFIG";

/// Dossier système (logs) sous la racine de données.
pub const SYSTEM_DIR: &str = "_system";

/// Moteur de stockage choisi à l'ouverture de la connexion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "fs" => Ok(StoreBackend::File),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!("Backend inconnu : {}", other))),
        }
    }
}

/// Traitement des chaînes non analysables affectées à un champ `*_at`.
///
/// `Strict` rejette la valeur ; `Lenient` conserve l'ancien comportement
/// (remplacement par l'instant courant, avec un avertissement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    #[default]
    Strict,
    Lenient,
}

impl FromStr for TimestampPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TimestampPolicy::Strict),
            "lenient" => Ok(TimestampPolicy::Lenient),
            other => Err(AppError::Config(format!(
                "Politique d'horodatage inconnue : {}",
                other
            ))),
        }
    }
}

impl fmt::Display for TimestampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampPolicy::Strict => write!(f, "strict"),
            TimestampPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Configuration d'une connexion. Aucune instance globale : chaque
/// `DbConnection` reçoit la sienne.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_root: PathBuf,
    pub database: String,
    pub backend: StoreBackend,
    pub cache_capacity: usize,
    pub timestamp_policy: TimestampPolicy,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            database: "content_creator".to_string(),
            backend: StoreBackend::File,
            cache_capacity: 1000,
            timestamp_policy: TimestampPolicy::Strict,
            log_level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Charge la configuration : défauts, puis fichier JSON optionnel
    /// (argument ou `SQLDOC_CONFIG`), puis surcharges d'environnement.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env::get_optional(CONFIG_FILE_VAR).map(PathBuf::from));

        let mut config = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Lecture impossible de {:?} : {}", path, e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Configuration invalide {:?} : {}", path, e)))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(root) = env::get_optional("DATA_ROOT") {
            self.data_root = PathBuf::from(root);
        }
        if let Some(db) = env::get_optional("DATABASE") {
            self.database = db;
        }
        if let Some(backend) = env::get_optional("BACKEND") {
            self.backend = backend.parse()?;
        }
        if env::get_optional("CACHE_CAPACITY").is_some() {
            self.cache_capacity = env::get_parsed("CACHE_CAPACITY")?;
        }
        if let Some(policy) = env::get_optional("TIMESTAMP_POLICY") {
            self.timestamp_policy = policy.parse()?;
        }
        if let Some(level) = env::get_optional("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(AppError::Config("Nom de base vide".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(AppError::Config(
                "cache_capacity doit être strictement positif".to_string(),
            ));
        }
        Ok(())
    }

    /// Racine physique de la base courante.
    pub fn db_root(&self) -> PathBuf {
        self.data_root.join(&self.database)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_root.join(SYSTEM_DIR).join("logs")
    }
}
