use placemark_core::db::migrations::latest_version;
use placemark_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "marked_places");
    assert_table_exists(&conn, "anonymous_identity");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("placemark.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "marked_places");
}

#[test]
fn open_db_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("placemark.db");

    let conn = open_db(&path).unwrap();
    assert_table_exists(&conn, "marked_places");
    assert!(path.exists());
}

#[test]
fn legacy_duplicate_rows_are_collapsed_before_unique_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE marked_places (
            mp_id INTEGER PRIMARY KEY AUTOINCREMENT,
            place_id string,
            name string,
            latitude decimal(9,6),
            longitude decimal(9,6),
            address string
        );
        INSERT INTO marked_places (place_id, name, latitude, longitude, address)
        VALUES ('p1', 'First', 1.0, 2.0, 'a'),
               ('p2', 'Second', 3.0, 4.0, 'b'),
               ('p1', 'First again', 1.0, 2.0, 'a');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let names: Vec<String> = conn
        .prepare("SELECT name FROM marked_places ORDER BY mp_id;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["First".to_string(), "Second".to_string()]);

    let duplicate = conn.execute(
        "INSERT INTO marked_places (place_id, name, latitude, longitude) VALUES ('p1', 'x', 0, 0);",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
