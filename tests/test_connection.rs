//! Connection integration tests: raw SQL execution, table registration, etc.

mod common;

use std::io::Write;

use tempfile::NamedTempFile;
use tracker_analytics::{AnalyticsError, Connection, FieldTemplate, FieldType};

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

#[test]
fn execute_returns_correct_rows() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute("SELECT name FROM timer_entries ORDER BY duration_minutes", &[])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "reading");
}

#[test]
fn execute_with_params() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT * FROM counter_entries WHERE name = ?",
            &["coffee".to_string()],
        )
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn execute_returns_empty_for_no_matches() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT * FROM counter_entries WHERE name = ?",
            &["nonexistent".to_string()],
        )
        .unwrap();
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// execute_scalar
// ---------------------------------------------------------------------------

#[test]
fn execute_scalar_returns_single_value() {
    let conn = common::setup_sample_db();

    let count = conn
        .execute_scalar("SELECT COUNT(*) FROM tasks", &[])
        .unwrap();
    assert_eq!(count.and_then(|v| v.as_i64()), Some(5));
}

#[test]
fn execute_scalar_returns_none_for_empty_result() {
    let conn = common::setup_sample_db();

    let value = conn
        .execute_scalar("SELECT name FROM counter_entries WHERE name = 'nobody'", &[])
        .unwrap();
    assert!(value.is_none());
}

#[test]
fn sums_are_narrowed_to_integers() {
    let conn = common::setup_sample_db();

    let total = conn
        .execute_scalar("SELECT SUM(value) FROM counter_entries", &[])
        .unwrap();
    assert_eq!(total.and_then(|v| v.as_i64()), Some(21));
}

// ---------------------------------------------------------------------------
// Table registration
// ---------------------------------------------------------------------------

#[test]
fn register_table_from_ndjson_creates_queryable_table() {
    let conn = Connection::open_in_memory().unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"name": "coffee", "date": "2024-01-01", "value": 2}}"#).unwrap();
    writeln!(file, r#"{{"name": "coffee", "date": "2024-01-02", "value": 1}}"#).unwrap();
    file.flush().unwrap();

    conn.register_table_from_ndjson("counter_entries", file.path().to_str().unwrap())
        .unwrap();

    let rows = conn
        .execute("SELECT * FROM counter_entries ORDER BY date", &[])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["value"], 1);
    assert_eq!(conn.tables(), vec!["counter_entries"]);
}

#[test]
fn file_database_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.duckdb");

    {
        let conn = Connection::open(&path).unwrap();
        conn.raw()
            .execute_batch("CREATE TABLE counter_entries AS SELECT 'coffee' AS name, 2 AS value")
            .unwrap();
    }

    let conn = Connection::open(&path).unwrap();
    assert!(conn.table_exists("counter_entries").unwrap());
    let rows = conn.execute("SELECT name, value FROM counter_entries", &[]).unwrap();
    assert_eq!(rows[0]["name"], "coffee");
    assert_eq!(rows[0]["value"], 2);
}

#[test]
fn register_table_replaces_existing_table() {
    let conn = Connection::open_in_memory().unwrap();

    conn.register_table_from_rows("replaceable", &[serde_json::json!({"val": "old"})])
        .unwrap();
    conn.register_table_from_rows("replaceable", &[serde_json::json!({"val": "new"})])
        .unwrap();

    let rows = conn.execute("SELECT * FROM replaceable", &[]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["val"], "new");
    assert_eq!(conn.tables().len(), 1);
}

#[test]
fn register_table_from_zero_rows_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = conn.register_table_from_rows("empty", &[]).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidArgument(_)));
}

#[test]
fn tables_lists_registered_names_sorted() {
    let conn = common::setup_sample_db();
    assert_eq!(
        conn.tables(),
        vec![
            "counter_entries",
            "custom_field_templates",
            "field_entries",
            "tasks",
            "timer_entries"
        ]
    );
}

#[test]
fn table_exists_checks_the_catalog() {
    let conn = common::setup_sample_db();
    assert!(conn.table_exists("tasks").unwrap());
    assert!(!conn.table_exists("habits").unwrap());
}

// ---------------------------------------------------------------------------
// raw
// ---------------------------------------------------------------------------

#[test]
fn raw_provides_access_to_underlying_duckdb_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let raw = conn.raw();
    raw.execute_batch("CREATE TABLE raw_test (id INTEGER, value TEXT)")
        .unwrap();
    raw.execute_batch("INSERT INTO raw_test VALUES (1, 'hello')")
        .unwrap();

    let rows = conn.execute("SELECT * FROM raw_test", &[]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["value"], "hello");
    assert!(conn.table_exists("raw_test").unwrap());
}

// ---------------------------------------------------------------------------
// execute_into
// ---------------------------------------------------------------------------

#[test]
fn execute_into_deserializes_templates() {
    let conn = common::setup_sample_db();

    let templates: Vec<FieldTemplate> = conn
        .execute_into(
            "SELECT id, \"key\", field_type FROM custom_field_templates ORDER BY id",
            &[],
        )
        .unwrap();
    assert_eq!(templates.len(), 4);
    assert_eq!(templates[0].key, "mood");
    assert_eq!(templates[3].field_type, FieldType::Boolean);
}

// ---------------------------------------------------------------------------
// Type conversions
// ---------------------------------------------------------------------------

#[test]
fn null_values_are_converted_to_json_null() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT minutes_to_complete FROM tasks WHERE NOT completed LIMIT 1",
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["minutes_to_complete"].is_null());
}

#[test]
fn boolean_values_are_converted_correctly() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute("SELECT completed FROM tasks ORDER BY date LIMIT 1", &[])
        .unwrap();
    assert!(rows[0]["completed"].is_boolean());
}

#[test]
fn dates_formatted_in_sql_come_back_as_strings() {
    let conn = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT strftime(CAST(date AS DATE), '%Y-%m-%d') AS day FROM tasks ORDER BY date LIMIT 1",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0]["day"], "2024-01-01");
}
