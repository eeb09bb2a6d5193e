// FICHIER : sqldoc/src/utils/mod.rs

pub mod config;
pub mod env;
pub mod error;
pub mod logger;

pub use config::{AppConfig, StoreBackend, TimestampPolicy};
pub use error::{AppError, Result};
pub use logger::init_logging;

/// **Le Prélude** : À utiliser via `use crate::utils::prelude::*;`
pub mod prelude {
    pub use super::config::{AppConfig, TimestampPolicy};
    pub use super::error::{AppError, Result};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Map, Value};
    pub use tracing::{debug, error, info, instrument, warn};
}
