// FICHIER : sqldoc/tests/json_db_suite/identity_tests.rs

use crate::init_test_env;
use serde_json::json;
use sqldoc::json_db::identity::{surrogate_of, SURROGATE_MODULUS};

#[test]
fn test_surrogate_is_stable_across_processes() {
    // Valeurs figées : toute dépendance à une graine de processus casserait ce test
    assert_eq!(surrogate_of("abc"), 128_432_319);
    assert_eq!(surrogate_of("doc-26015"), 83_698_543);
    let id = "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b";
    assert_eq!(surrogate_of(id), surrogate_of(id));
    assert!((surrogate_of(id) as u64) < SURROGATE_MODULUS);
}

#[tokio::test]
async fn test_native_of_round_trip() {
    let env = init_test_env().await;
    let mut surrogates = Vec::new();
    for i in 0..8 {
        let s = env
            .conn
            .insert(
                "INSERT INTO videos (title) VALUES (?)",
                &[json!(format!("video {}", i))],
            )
            .await
            .unwrap();
        surrogates.push(s);
    }

    for s in &surrogates {
        let native = env.conn.native_of(*s, "videos").await.unwrap().unwrap();
        assert_eq!(env.conn.surrogate_of(&native), *s);
    }
}

#[tokio::test]
async fn test_native_of_not_found_is_absence() {
    let env = init_test_env().await;
    let s = env
        .conn
        .insert("INSERT INTO videos (title) VALUES (?)", &[json!("seule")])
        .await
        .unwrap();
    let other = (s + 1) % SURROGATE_MODULUS as u32;

    assert_eq!(env.conn.native_of(other, "videos").await.unwrap(), None);
    // Même substitut, mauvaise collection
    assert_eq!(env.conn.native_of(s, "scripts").await.unwrap(), None);
    // Collection jamais créée
    assert_eq!(env.conn.native_of(s, "inexistante").await.unwrap(), None);
}
