// FICHIER : sqldoc/tests/json_db_suite/write_tests.rs

use crate::init_test_env;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqldoc::json_db::values::{as_date, DATE_KEY};
use sqldoc::AppError;

#[tokio::test]
async fn test_insert_defaults_timestamps() {
    let env = init_test_env().await;
    let before = Utc::now();
    let s = env
        .conn
        .insert(
            "INSERT INTO blog_urls (url, status) VALUES (?, ?)",
            &[json!("https://example.com/post"), json!("pending")],
        )
        .await
        .unwrap();

    let native = env.conn.native_of(s, "blog_urls").await.unwrap().unwrap();
    let stored = env
        .conn
        .store()
        .get("blog_urls", &native)
        .await
        .unwrap()
        .unwrap();

    for field in ["created_at", "updated_at"] {
        // Stocké comme date native, pas comme chaîne
        assert!(stored[field].get(DATE_KEY).is_some(), "{} : {:?}", field, stored[field]);
        let at = as_date(&stored[field]).unwrap();
        assert!((at - before).num_seconds().abs() <= 5);
    }

    let rows = env
        .conn
        .read("SELECT * FROM blog_urls WHERE id = ?", &[json!(s)])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let rendered = rows[0]["created_at"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(rendered).is_ok());
}

#[tokio::test]
async fn test_insert_keeps_explicit_timestamp() {
    let env = init_test_env().await;
    let s = env
        .conn
        .insert(
            "INSERT INTO scripts (title, created_at) VALUES (?, ?)",
            &[json!("pilote"), json!("2023-06-01T08:30:00Z")],
        )
        .await
        .unwrap();

    let rows = env
        .conn
        .read("SELECT created_at FROM scripts WHERE id = ?", &[json!(s)])
        .await
        .unwrap();
    assert_eq!(rows[0]["created_at"], "2023-06-01T08:30:00.000000Z");
}

#[tokio::test]
async fn test_insert_strict_rejects_bad_timestamp() {
    let env = init_test_env().await;
    let err = env
        .conn
        .insert(
            "INSERT INTO scripts (title, published_at) VALUES (?, ?)",
            &[json!("x"), json!("pas une date")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTimestamp { .. }), "{:?}", err);

    let rows = env.conn.read("SELECT * FROM scripts", &[]).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_update_by_id_is_not_broadened() {
    let env = init_test_env().await;
    let mut ids = Vec::new();
    for title in ["un", "deux", "trois"] {
        ids.push(
            env.conn
                .insert(
                    "INSERT INTO videos (title, status) VALUES (?, ?)",
                    &[json!(title), json!("draft")],
                )
                .await
                .unwrap(),
        );
    }

    // Substitut absent : aucun document touché
    let missing = ids.iter().max().unwrap() + 1;
    let n = env
        .conn
        .update(
            "UPDATE videos SET status = ? WHERE id = ?",
            &[json!("published"), json!(missing)],
        )
        .await
        .unwrap();
    assert_eq!(n, 0);
    let drafts = env
        .conn
        .read("SELECT COUNT(*) AS n FROM videos WHERE status = ?", &[json!("draft")])
        .await
        .unwrap();
    assert_eq!(drafts[0]["n"], 3);

    let n = env
        .conn
        .update(
            "UPDATE videos SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            &[json!("published"), json!(ids[1])],
        )
        .await
        .unwrap();
    assert_eq!(n, 1);

    let published = env
        .conn
        .read("SELECT title FROM videos WHERE status = ?", &[json!("published")])
        .await
        .unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["title"], "deux");
}

#[tokio::test]
async fn test_update_refreshes_timestamp() {
    let env = init_test_env().await;
    let s = env
        .conn
        .insert(
            "INSERT INTO videos (title, updated_at) VALUES (?, ?)",
            &[json!("ancienne"), json!("2020-01-01T00:00:00Z")],
        )
        .await
        .unwrap();

    env.conn
        .update(
            "UPDATE videos SET updated_at = ? WHERE id = ?",
            &[json!("CURRENT_TIMESTAMP"), json!(s)],
        )
        .await
        .unwrap();

    let rows = env
        .conn
        .read("SELECT updated_at FROM videos WHERE id = ?", &[json!(s)])
        .await
        .unwrap();
    let at = DateTime::parse_from_rfc3339(rows[0]["updated_at"].as_str().unwrap()).unwrap();
    assert!(Utc::now().signed_duration_since(at) < Duration::seconds(5));
}

#[tokio::test]
async fn test_insert_with_explicit_native_id_and_duplicate() {
    let env = init_test_env().await;
    let native = "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b";
    let s = env
        .conn
        .insert(
            "INSERT INTO social_media_posts (_id, platform) VALUES (?, ?)",
            &[json!(native), json!("mastodon")],
        )
        .await
        .unwrap();
    assert_eq!(s, env.conn.surrogate_of(native));

    let err = env
        .conn
        .insert(
            "INSERT INTO social_media_posts (_id, platform) VALUES (?, ?)",
            &[json!(native), json!("bluesky")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateId { .. }), "{:?}", err);
}
