use chrono::{TimeZone, Utc};
use journey_core::db::migrations::latest_version;
use journey_core::db::{open_db, open_db_in_memory, DbError};
use journey_core::{EntryStore, KeyValueStore, KvError, NewEntry, SqliteKeyValueStore};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_items");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journey.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "kv_items");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let kv_err = SqliteKeyValueStore::open(&path)
        .err()
        .expect("kv open should fail");
    assert!(matches!(kv_err, KvError::Db(DbError::SchemaTooNew { .. })));
}

#[test]
fn sqlite_failures_after_open_arrive_as_db_errors() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE kv_items;").unwrap();
    let kv = SqliteKeyValueStore::new(conn);

    let err = kv.get_item("journals").unwrap_err();
    assert!(matches!(err, KvError::Db(DbError::Sqlite(_))), "{err}");
}

#[test]
fn entries_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journey.db");
    let at = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();

    let uid = {
        let store = EntryStore::new(SqliteKeyValueStore::open(&path).unwrap());
        let entries = store.append(NewEntry::new("persisted", at)).unwrap();
        entries[0].uid.clone()
    };

    let reopened = EntryStore::new(SqliteKeyValueStore::open(&path).unwrap());
    let entries = reopened.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uid, uid);
    assert_eq!(entries[0].text, "persisted");
    assert_eq!(entries[0].date_time, at);

    let conn = Connection::open(&path).unwrap();
    let raw: String = conn
        .query_row(
            "SELECT value FROM kv_items WHERE key = 'journals';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(raw.contains("\"dateTime\":\"2024-01-05T10:00:00.000Z\""));
}

fn schema_version(conn: &Connection) -> u32 {
    journey_core::db::migrations::schema_version(conn).unwrap()
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
