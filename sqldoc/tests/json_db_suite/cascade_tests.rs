// FICHIER : sqldoc/tests/json_db_suite/cascade_tests.rs

use crate::{init_env_with_catalog, init_test_env};
use serde_json::json;
use sqldoc::json_db::collections::CollectionCatalog;
use sqldoc::json_db::records::{Script, Video};

async fn count(env: &crate::TestEnv, collection: &str) -> u64 {
    let rows = env
        .conn
        .read(&format!("SELECT COUNT(*) AS n FROM {}", collection), &[])
        .await
        .unwrap();
    rows[0]["n"].as_u64().unwrap()
}

#[tokio::test]
async fn test_cascade_delete_removes_children() {
    let env = init_test_env().await;
    let script = env
        .conn
        .insert("INSERT INTO scripts (title) VALUES (?)", &[json!("tuto")])
        .await
        .unwrap();
    let script_native = env.conn.native_of(script, "scripts").await.unwrap().unwrap();

    // Une clé substitut, une clé native
    let v1 = env
        .conn
        .insert(
            "INSERT INTO videos (title, script_id) VALUES (?, ?)",
            &[json!("v1"), json!(script)],
        )
        .await
        .unwrap();
    env.conn
        .insert(
            "INSERT INTO videos (title, script_id) VALUES (?, ?)",
            &[json!("v2"), json!(script_native)],
        )
        .await
        .unwrap();
    env.conn
        .insert(
            "INSERT INTO social_media_posts (platform, video_id) VALUES (?, ?)",
            &[json!("mastodon"), json!(v1)],
        )
        .await
        .unwrap();
    // Vidéo orpheline, hors cascade
    env.conn
        .insert(
            "INSERT INTO videos (title, script_id) VALUES (?, ?)",
            &[json!("autre"), json!(script + 1)],
        )
        .await
        .unwrap();

    let videos: Vec<Video> = env
        .conn
        .read_as("SELECT * FROM videos ORDER BY title ASC", &[])
        .await
        .unwrap();
    assert_eq!(videos.len(), 3);

    let deleted = env
        .conn
        .delete("DELETE FROM scripts WHERE id = ?", &[json!(script)])
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    assert_eq!(count(&env, "scripts").await, 0);
    assert_eq!(count(&env, "videos").await, 1);
    assert_eq!(count(&env, "social_media_posts").await, 0);
}

#[tokio::test]
async fn test_delete_without_children() {
    let env = init_test_env().await;
    let a = env
        .conn
        .insert("INSERT INTO scripts (title) VALUES (?)", &[json!("a")])
        .await
        .unwrap();
    env.conn
        .insert("INSERT INTO scripts (title) VALUES (?)", &[json!("b")])
        .await
        .unwrap();

    let deleted = env
        .conn
        .delete("DELETE FROM scripts WHERE id = ?", &[json!(a)])
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let left: Vec<Script> = env.conn.read_as("SELECT * FROM scripts", &[]).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].title.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_delete_requires_explicit_id() {
    let env = init_test_env().await;
    env.conn
        .insert("INSERT INTO scripts (title) VALUES (?)", &[json!("garde")])
        .await
        .unwrap();

    let deleted = env
        .conn
        .delete("DELETE FROM scripts WHERE title = ?", &[json!("garde")])
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    let deleted = env
        .conn
        .delete("DELETE FROM scripts WHERE id = ?", &[json!("inconnu")])
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(count(&env, "scripts").await, 1);
}

#[tokio::test]
async fn test_cascade_cycle_terminates() {
    let catalog = CollectionCatalog::empty()
        .with_collection("nodes", vec![])
        .with_cascade("nodes", "nodes", "parent_id");
    let env = init_env_with_catalog(catalog).await;

    let root = env
        .conn
        .insert("INSERT INTO nodes (name) VALUES (?)", &[json!("racine")])
        .await
        .unwrap();
    let child = env
        .conn
        .insert(
            "INSERT INTO nodes (name, parent_id) VALUES (?, ?)",
            &[json!("enfant"), json!(root)],
        )
        .await
        .unwrap();
    // Boucle : la racine pointe vers son enfant
    env.conn
        .update(
            "UPDATE nodes SET parent_id = ? WHERE id = ?",
            &[json!(child), json!(root)],
        )
        .await
        .unwrap();

    let deleted = env
        .conn
        .delete("DELETE FROM nodes WHERE id = ?", &[json!(root)])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(count(&env, "nodes").await, 0);
}
