// FICHIER : sqldoc/src/lib.rs

//! Couche de traduction SQL -> stockage documentaire.
//!
//! Les appelants écrivent un petit dialecte SQL (`SELECT`, `INSERT`, `UPDATE`,
//! `DELETE` avec des paramètres `?`), le moteur le traduit en opérations sur un
//! magasin de documents et renvoie des lignes plates où l'identifiant natif est
//! remplacé par un entier de substitution stable.

pub mod json_db;
pub mod utils;

pub use json_db::connection::DbConnection;
pub use json_db::query::executor::QueryOutcome;
pub use json_db::values::Record;
pub use utils::{AppConfig, AppError, Result};
