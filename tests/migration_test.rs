//! Migration and seed runner behavior.

use guilddb::config::{DbConfig, Dialect};
use guilddb::db::{EntityRegistry, Migration, Seed, SqlConnector, migrations};
use std::path::Path;

fn sqlite_config(dir: &Path) -> DbConfig {
    DbConfig {
        dialect: Dialect::Sqlite,
        host: "localhost".into(),
        port: 3306,
        database: "migrate".into(),
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
    connector
}

async fn count_rows(connector: &SqlConnector, sql: &str) -> usize {
    connector
        .query(sql, &[])
        .await
        .unwrap()
        .expect("SELECT must return a result set")
        .row_count()
}

#[tokio::test]
async fn test_migration_applies_once() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let units = [Migration::new(
        "001_create_scores",
        &["CREATE TABLE IF NOT EXISTS Scores (UID VARCHAR(40), WINS INTEGER)"],
    )];

    migrations::run_migrations(&connector, &units).await.unwrap();
    migrations::run_migrations(&connector, &units).await.unwrap();

    // Exactly one bookkeeping record regardless of how many startups ran it.
    assert_eq!(count_rows(&connector, "SELECT NAME FROM Migrations").await, 1);
}

#[tokio::test]
async fn test_failed_migration_stays_pending_and_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let units = [
        Migration::new("001_broken", &["CREATE TABLE ("]),
        Migration::new(
            "002_create_scores",
            &["CREATE TABLE IF NOT EXISTS Scores (UID VARCHAR(40))"],
        ),
    ];

    migrations::run_migrations(&connector, &units).await.unwrap();

    let recorded = connector
        .query("SELECT NAME FROM Migrations ORDER BY NAME", &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recorded.row_count(), 1);
    assert_eq!(recorded.value(1, 1).unwrap(), "002_create_scores");

    // The broken unit was never recorded, so a later startup retries it.
    let fixed = [
        Migration::new(
            "001_broken",
            &["CREATE TABLE IF NOT EXISTS Fixed (ID INTEGER)"],
        ),
        units[1].clone(),
    ];
    migrations::run_migrations(&connector, &fixed).await.unwrap();
    assert_eq!(count_rows(&connector, "SELECT NAME FROM Migrations").await, 2);
}

#[tokio::test]
async fn test_multi_statement_unit_is_all_or_nothing_for_bookkeeping() {
    let dir = tempfile::tempdir().unwrap();
    let connector = started_connector(dir.path()).await;

    let units = [Migration::new(
        "001_two_steps",
        &[
            "CREATE TABLE IF NOT EXISTS StepOne (ID INTEGER)",
            "THIS IS NOT SQL",
        ],
    )];

    migrations::run_migrations(&connector, &units).await.unwrap();
    assert_eq!(count_rows(&connector, "SELECT NAME FROM Migrations").await, 0);
}

#[tokio::test]
async fn test_seed_applies_once_across_startups() {
    let dir = tempfile::tempdir().unwrap();

    let seeds = [Seed::new(
        "v1",
        &["INSERT INTO Opt_out (GID, UID) VALUES ('seed-guild', 'seed-user')"],
    )];

    {
        let connector = SqlConnector::new(sqlite_config(dir.path()));
        connector
            .start(&EntityRegistry::with_builtins(), &[], &seeds)
            .await;
        assert_eq!(count_rows(&connector, "SELECT * FROM Opt_out").await, 1);
        connector.close().await;
    }

    // Second startup against the same database file: the seed is skipped.
    {
        let connector = SqlConnector::new(sqlite_config(dir.path()));
        connector
            .start(&EntityRegistry::with_builtins(), &[], &seeds)
            .await;
        assert_eq!(count_rows(&connector, "SELECT * FROM Opt_out").await, 1);
        assert_eq!(count_rows(&connector, "SELECT VERSION FROM Seeds").await, 1);
        connector.close().await;
    }
}
