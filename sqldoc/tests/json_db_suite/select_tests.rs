// FICHIER : sqldoc/tests/json_db_suite/select_tests.rs

use crate::init_test_env;
use serde_json::{json, Value};
use sqldoc::json_db::query::{parse, ComparisonOperator, Condition, QueryDescriptor};

async fn seed_widgets(env: &crate::TestEnv, rows: &[(&str, i64)]) {
    for (status, priority) in rows {
        env.conn
            .insert(
                "INSERT INTO widgets (status, priority) VALUES (?, ?)",
                &[json!(status), json!(priority)],
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_filter_correctness() {
    let env = init_test_env().await;
    let params = [json!("active"), json!(3)];
    let query = "SELECT * FROM widgets WHERE status = ? AND priority > ?";

    let QueryDescriptor::Read(select) = parse(query, &params).unwrap() else {
        panic!("SELECT attendu");
    };
    assert_eq!(
        select.filter.conditions,
        vec![
            Condition::Field {
                field: "status".into(),
                operator: ComparisonOperator::Eq,
                value: json!("active"),
            },
            Condition::Field {
                field: "priority".into(),
                operator: ComparisonOperator::Gt,
                value: json!(3),
            },
        ]
    );

    seed_widgets(
        &env,
        &[("active", 5), ("active", 9), ("idle", 8), ("active", 2), ("active", 4)],
    )
    .await;

    let rows = env.conn.read(query, &params).await.unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert!(row["id"].is_u64(), "id doit être un entier : {:?}", row);
        assert_eq!(row["status"], "active");
        assert!(row["priority"].as_i64().unwrap() > 3);
    }
}

#[tokio::test]
async fn test_count_query() {
    let env = init_test_env().await;
    let mut data = vec![("active", 1); 7];
    data.extend([("idle", 1), ("idle", 2)]);
    seed_widgets(&env, &data).await;

    let rows = env
        .conn
        .read(
            "SELECT COUNT(*) as total FROM widgets WHERE status = ?",
            &[json!("active")],
        )
        .await
        .unwrap();
    assert_eq!(Value::Array(rows.into_iter().map(Value::Object).collect()), json!([{ "total": 7 }]));
}

#[tokio::test]
async fn test_order_by_with_alias_stripping() {
    let env = init_test_env().await;
    let rows = [
        ("a", "2024-01-02T00:00:00Z", "2024-01-01T00:00:00Z"),
        ("b", "2024-01-03T00:00:00Z", "2024-01-01T00:00:00Z"),
        ("c", "2024-01-02T00:00:00Z", "2024-01-01T12:00:00Z"),
        ("d", "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z"),
    ];
    for (name, updated, created) in rows {
        env.conn
            .insert(
                "INSERT INTO widgets (name, updated_at, created_at) VALUES (?, ?, ?)",
                &[json!(name), json!(updated), json!(created)],
            )
            .await
            .unwrap();
    }

    let sorted = env
        .conn
        .read(
            "SELECT w.* FROM widgets w ORDER BY w.updated_at DESC, w.created_at DESC",
            &[],
        )
        .await
        .unwrap();
    let names: Vec<&str> = sorted.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(names, vec!["b", "c", "a", "d"]);
    // Dates rendues en chaînes ISO-8601
    assert_eq!(sorted[0]["updated_at"], "2024-01-03T00:00:00.000000Z");
}

#[tokio::test]
async fn test_unresolved_id_reads_nothing() {
    let env = init_test_env().await;
    seed_widgets(&env, &[("active", 1), ("active", 2)]).await;
    let rows = env
        .conn
        .read("SELECT * FROM widgets WHERE id = ?", &[json!("not-an-id")])
        .await
        .unwrap();
    assert!(rows.is_empty());

    let count = env
        .conn
        .read("SELECT COUNT(*) AS n FROM widgets WHERE id = ?", &[json!(1)])
        .await
        .unwrap();
    // Le substitut 1 a une chance négligeable d'exister parmi 2 documents
    assert_eq!(count[0]["n"], 0);
}

#[tokio::test]
async fn test_read_by_native_id_side_field() {
    let env = init_test_env().await;
    seed_widgets(&env, &[("active", 1), ("idle", 2)]).await;
    let all = env.conn.read("SELECT * FROM widgets", &[]).await.unwrap();
    let idle = all.iter().find(|r| r["status"] == "idle").unwrap();
    let native = idle["_native_id"].clone();

    let rows = env
        .conn
        .read("SELECT status FROM widgets WHERE id = ?", &[native.clone()])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["_native_id"], native);
    assert_eq!(rows[0]["status"], "idle");
    assert!(rows[0].get("priority").is_none());
}
