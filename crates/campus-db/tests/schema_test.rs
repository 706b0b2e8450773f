//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let applied = campus_db::run_migrations(&db).await.unwrap();
    assert_eq!(applied as u32, campus_db::latest_version());

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "tenant",
        "user",
        "group",
        "member_of",
        "module",
        "section",
        "quiz",
        "module_assignment",
        "section_completion",
        "quiz_attempt",
        "module_access",
        "progress_override",
        "certificate",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    campus_db::run_migrations(&db).await.unwrap();
    let second = campus_db::run_migrations(&db).await.unwrap();
    assert_eq!(second, 0, "second run should apply nothing");
}

#[tokio::test]
async fn schema_v1_loads_on_its_own() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    db.query(campus_db::schema_v1())
        .await
        .unwrap()
        .check()
        .unwrap();
}
