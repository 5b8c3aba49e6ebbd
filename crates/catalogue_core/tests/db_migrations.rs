use catalogue_core::db::migrations::{latest_version, schema_sql};
use catalogue_core::db::{open_db, open_db_in_memory};

#[test]
fn fresh_database_is_migrated_to_latest_version() {
    let conn = open_db_in_memory().unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn migrated_database_has_catalogue_items_shape() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('catalogue_items');")
        .unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();

    for expected in [
        "id",
        "key",
        "value",
        "lang",
        "catalogable_type",
        "catalogable_id",
        "created_at",
        "updated_at",
    ] {
        assert!(
            columns.iter().any(|column| column == expected),
            "missing column {expected}"
        );
    }
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO catalogue_items (\"key\", value, lang, catalogable_type, catalogable_id)
             VALUES ('title', 'Hello', 'en', 'test_models', 1);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM catalogue_items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);

    let version: u32 = second
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn schema_sql_exposes_the_full_catalogue_schema() {
    let sql = schema_sql();
    assert!(sql.contains("CREATE TABLE catalogue_items"));
    assert!(sql.contains("catalogable_type"));
}
