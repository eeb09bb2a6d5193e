// FICHIER : sqldoc/src/json_db/identity.rs

//! Traduction d'identifiants : identifiant natif (UUID v7) <-> entier de
//! substitution stable.
//!
//! Le substitut est dérivé par hachage, sans table de correspondance :
//! SHA-256 de la forme texte de l'identifiant natif, 8 premiers caractères
//! hexadécimaux du condensat, réduits modulo 10^9. Il est déterministe d'un
//! processus à l'autre (aucune graine aléatoire) mais **non injectif** : deux
//! identifiants natifs distincts peuvent partager un substitut. Ce risque est
//! accepté ; une collision est signalée dans les logs, jamais corrigée.
//!
//! La résolution inverse (`native_of`) parcourt toute la collection :
//! coût O(taille de la collection) par appel. Une table persistée rendrait la
//! recherche O(1) ; elle n'existe pas ici.

use crate::json_db::storage::cache::Cache;
use crate::json_db::storage::DocumentStore;
use crate::utils::prelude::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Borne exclusive des substituts.
pub const SURROGATE_MODULUS: u64 = 1_000_000_000;

/// Longueur de la forme texte d'un identifiant natif.
pub const NATIVE_ID_LEN: usize = 36;

/// Fonction pure : même entrée, même sortie, résultat dans `[0, 10^9)`.
pub fn surrogate_of(native_id: &str) -> u32 {
    let digest = Sha256::digest(native_id.as_bytes());
    let prefix = hex::encode(&digest[..4]);
    // 8 caractères hexadécimaux tiennent toujours dans un u64
    let value = u64::from_str_radix(&prefix, 16).unwrap_or(0);
    (value % SURROGATE_MODULUS) as u32
}

/// Vrai si la valeur a la forme d'un identifiant natif (UUID hyphéné, 36 caractères).
pub fn is_native_shaped(value: &str) -> bool {
    value.len() == NATIVE_ID_LEN && Uuid::try_parse(value).is_ok()
}

/// Forme canonique (minuscules, hyphénée) d'un identifiant natif.
pub fn canonical_native(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if is_native_shaped(trimmed) {
        Uuid::try_parse(trimmed).ok().map(|u| u.to_string())
    } else {
        None
    }
}

/// Nouvel identifiant natif, triable par date de création.
pub fn new_native_id() -> String {
    Uuid::now_v7().to_string()
}

/// Lit un substitut depuis une valeur liée (entier ou chaîne numérique).
pub fn surrogate_from_value(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    if n < SURROGATE_MODULUS {
        Some(n as u32)
    } else {
        None
    }
}

/// Traducteur avec mémoïsation des hachages déjà calculés.
#[derive(Debug, Clone)]
pub struct IdentifierTranslator {
    memo: Cache<String, u32>,
}

impl Default for IdentifierTranslator {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl IdentifierTranslator {
    pub fn new(capacity: usize) -> Self {
        Self {
            memo: Cache::new(capacity),
        }
    }

    pub fn surrogate(&self, native_id: &str) -> u32 {
        self.memo
            .get_or_insert_with(native_id.to_string(), || surrogate_of(native_id))
    }

    /// Résout un substitut dans `collection`. `Ok(None)` signifie
    /// "introuvable" ; seule une panne du magasin produit une erreur.
    pub async fn native_of(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        surrogate: u32,
    ) -> Result<Option<String>> {
        let ids = store.list_ids(collection).await?;
        debug!(
            "🐢 Résolution de {} : scan de {} identifiants dans '{}'",
            surrogate,
            ids.len(),
            collection
        );

        let mut matches = ids.into_iter().filter(|id| self.surrogate(id) == surrogate);
        let first = matches.next();
        let others = matches.count();
        if others > 0 {
            warn!(
                "⚠️ Collision de substitut {} dans '{}' : {} documents partagent ce substitut, le premier est retenu",
                surrogate,
                collection,
                others + 1
            );
        }
        Ok(first)
    }
}
