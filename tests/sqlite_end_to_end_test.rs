//! End-to-end tests against an embedded SQLite database.

use guilddb::config::{DbConfig, Dialect};
use guilddb::db::{EntityRegistry, SqlConnector};
use guilddb::error::DbError;
use guilddb::params;
use std::path::Path;

fn sqlite_config(dir: &Path) -> DbConfig {
    DbConfig {
        dialect: Dialect::Sqlite,
        host: "localhost".into(),
        port: 3306,
        database: "bot".into(),
        user: "root".into(),
        password: String::new(),
        pool_size: 2,
        data_dir: dir.to_path_buf(),
    }
}

async fn started_connector(dir: &Path) -> SqlConnector {
    let connector = SqlConnector::new(sqlite_config(dir));
    connector
        .start(&EntityRegistry::with_builtins(), &[], &[])
        .await;
    assert!(connector.is_connected().await);
    connector
}

#[tokio::test]
async fn test_startup_creates_bookkeeping_and_entity_tables() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let result = connector
        .query(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            &[],
        )
        .await
        .unwrap()
        .expect("SELECT must return a result set");

    let tables: Vec<&str> = (1..=result.row_count())
        .filter_map(|row| result.value(row, 1).and_then(|v| v.as_str()))
        .collect();

    assert!(tables.contains(&"Opt_out"));
    assert!(tables.contains(&"Migrations"));
    assert!(tables.contains(&"Seeds"));
}

#[tokio::test]
async fn test_select_on_empty_table_keeps_column_names() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let result = connector
        .query("SELECT * FROM Opt_out", &[])
        .await
        .unwrap()
        .expect("SELECT must return a result set");

    assert_eq!(result.row_count(), 0);
    assert!(!result.has_results());
    assert_eq!(result.column_count(), 2);
    assert_eq!(result.column_names(), ["GID", "UID"]);
}

#[tokio::test]
async fn test_insert_then_select_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let write = connector
        .query(
            "INSERT INTO Opt_out (GID, UID) VALUES (?, ?)",
            &params!["123", "456"],
        )
        .await
        .unwrap();
    assert!(write.is_none(), "writes return no result set");

    let result = connector
        .query("SELECT * FROM Opt_out", &[])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(result.value(1, 1).unwrap(), "123");
    assert_eq!(result.value(1, 2).unwrap(), "456");
}

#[tokio::test]
async fn test_select_many_rows() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    for i in 0..5 {
        connector
            .query(
                "INSERT INTO Opt_out (GID, UID) VALUES (?, ?)",
                &params![format!("g{}", i), format!("u{}", i)],
            )
            .await
            .unwrap();
    }

    let result = connector
        .query("SELECT * FROM Opt_out ORDER BY GID", &[])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.row_count(), 5);
    assert_eq!(result.column_count(), 2);
    assert_eq!(result.value(3, 1).unwrap(), "g2");
    assert_eq!(result.value(5, 2).unwrap(), "u4");
}

#[tokio::test]
async fn test_query_without_any_successful_connect_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let connector = SqlConnector::new(sqlite_config(dir.path()));

    let err = connector.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::NeverConnected));
}

#[tokio::test]
async fn test_query_reconnects_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    connector.close().await;
    assert!(!connector.is_connected().await);

    // A prior successful connect means the call transparently reconnects.
    let result = connector
        .query("SELECT 1", &[])
        .await
        .unwrap()
        .expect("SELECT must return a result set");

    assert!(connector.is_connected().await);
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.column_count(), 1);
    assert_eq!(result.value(1, 1).and_then(|v| v.as_i64()), Some(1));
}

#[tokio::test]
async fn test_failed_reconnect_is_attempted_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("store");
    let mut config = sqlite_config(dir.path());
    config.data_dir = data_dir.clone();

    let connector = SqlConnector::new(config);
    connector.connect().await;
    assert!(connector.is_connected().await);
    connector.close().await;

    // Replace the storage directory with a plain file so the reconnect
    // inside the next call cannot open the database again.
    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, b"").unwrap();

    let err = connector.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }), "got {:?}", err);

    // The single reconnect budget is spent; the connector stays down and a
    // second call fails the same way instead of looping.
    assert!(!connector.is_connected().await);
    let err = connector.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
}

#[tokio::test]
async fn test_statement_error_is_reported_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let err = connector
        .query("SELECT * FROM NoSuchTable", &[])
        .await
        .unwrap_err();
    assert!(!err.is_disconnect());
    // The connection survives a statement-level failure.
    assert!(connector.is_connected().await);
}
