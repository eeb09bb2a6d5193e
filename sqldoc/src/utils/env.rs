// FICHIER : sqldoc/src/utils/env.rs

use crate::utils::{AppError, Result};
use std::env;
use std::str::FromStr;

/// Préfixe commun des variables d'environnement reconnues.
pub const PREFIX: &str = "SQLDOC_";

fn prefixed(key: &str) -> String {
    if key.starts_with(PREFIX) {
        key.to_string()
    } else {
        format!("{}{}", PREFIX, key)
    }
}

/// Récupère une variable d'environnement (Requis).
pub fn get(key: &str) -> Result<String> {
    let full = prefixed(key);
    env::var(&full)
        .map_err(|_| AppError::Config(format!("Variable d'environnement manquante : {}", full)))
}

/// Récupère une variable d'environnement (Optionnel).
/// Une valeur vide est traitée comme absente.
pub fn get_optional(key: &str) -> Option<String> {
    env::var(prefixed(key)).ok().filter(|v| !v.trim().is_empty())
}

/// Récupère et parse une variable (ex: capacité de cache).
pub fn get_parsed<T: FromStr>(key: &str) -> Result<T> {
    let val = get(key)?;
    val.trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("Impossible de parser la variable : {}", key)))
}
