//! Connection pool management.
//!
//! The bot owns exactly one live pool at a time. A reconnect replaces the
//! handle wholesale (closing the old one first), so callers re-fetch the
//! current handle at the start of every operation and never cache it.

use crate::config::{DbConfig, Dialect};
use crate::db::migrations::{self, Migration, Seed};
use crate::db::schema::EntityRegistry;
use crate::error::{DbError, DbResult};
use sqlx::{
    MySqlPool, SqlitePool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
    }

    /// Whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        match self {
            DbPool::MySql(pool) => pool.is_closed(),
            DbPool::Sqlite(pool) => pool.is_closed(),
        }
    }
}

/// Owner of the single live connection pool.
///
/// `connect` and `close` never return errors to the caller; failures are
/// logged and reflected only through [`SqlConnector::is_connected`]. The
/// sticky `connected_once` latch records whether any connection ever
/// succeeded and gates the executor's reconnect-and-retry policy.
#[derive(Debug)]
pub struct SqlConnector {
    config: DbConfig,
    pool: RwLock<Option<DbPool>>,
    connected_once: AtomicBool,
}

impl SqlConnector {
    /// Create a connector. No connection is attempted until [`connect`] or
    /// [`start`] is called.
    ///
    /// [`connect`]: SqlConnector::connect
    /// [`start`]: SqlConnector::start
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
            connected_once: AtomicBool::new(false),
        }
    }

    /// The configuration this connector was built with.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Full startup sequence: connect, materialize the schema, then apply
    /// outstanding migrations and seeds. Mirrors what the bot does once at
    /// boot before any command traffic.
    pub async fn start(&self, registry: &EntityRegistry, migrations: &[Migration], seeds: &[Seed]) {
        self.connect().await;
        self.create_tables(registry).await;
        if let Err(e) = migrations::run_migrations(self, migrations).await {
            error!(error = %e, "Error while running migrations");
        }
        if let Err(e) = migrations::run_seeds(self, seeds).await {
            error!(error = %e, "Error while running seeds");
        }
    }

    /// Open a new pool for the configured dialect, replacing (and closing)
    /// any previous handle first.
    ///
    /// On failure the connector is left without a live handle; the error is
    /// logged, not returned. The `connected_once` latch keeps whatever value
    /// it had.
    pub async fn connect(&self) {
        info!(dialect = %self.config.dialect, "Connecting to database");

        let mut guard = self.pool.write().await;
        if let Some(old) = guard.take() {
            old.close().await;
            info!("Previous connection pool has been closed");
        }

        match self.open_pool().await {
            Ok(pool) => {
                self.connected_once.store(true, Ordering::Release);
                *guard = Some(pool);
                info!(
                    dialect = %self.config.dialect,
                    pool_size = self.config.pool_size,
                    "Database connection established"
                );
            }
            Err(e) => {
                error!(error = %e, "Database connection failed");
            }
        }
    }

    /// True iff a handle exists and still reports itself open.
    pub async fn is_connected(&self) -> bool {
        self.pool
            .read()
            .await
            .as_ref()
            .map(|p| !p.is_closed())
            .unwrap_or(false)
    }

    /// Close the current pool, if any. Idempotent.
    pub async fn close(&self) {
        let mut guard = self.pool.write().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            info!("Database connection closed");
        }
    }

    /// Whether any connection attempt has ever succeeded.
    pub fn connected_once(&self) -> bool {
        self.connected_once.load(Ordering::Acquire)
    }

    /// Clone of the current pool handle. Fetched fresh per operation, never
    /// cached across calls.
    pub(crate) async fn current_pool(&self) -> Option<DbPool> {
        self.pool.read().await.clone()
    }

    async fn open_pool(&self) -> DbResult<DbPool> {
        match self.config.dialect {
            Dialect::Embedded | Dialect::Sqlite => {
                let path = self.config.sqlite_path();
                if let Some(parent) = path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        warn!(dir = %parent.display(), error = %e, "Could not create storage directory");
                    }
                }

                let options = SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(self.config.pool_size)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(format!(
                            "Failed to open {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                Ok(DbPool::Sqlite(pool))
            }
            Dialect::MariaDb => {
                let options = MySqlConnectOptions::new()
                    .host(&self.config.host)
                    .port(self.config.port)
                    .username(&self.config.user)
                    .password(&self.config.password)
                    .database(&self.config.database)
                    .charset("utf8mb4");

                let pool = MySqlPoolOptions::new()
                    .max_connections(self.config.pool_size)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        DbError::connection(format!(
                            "Failed to connect to {}:{}: {}",
                            self.config.host, self.config.port, e
                        ))
                    })?;
                Ok(DbPool::MySql(pool))
            }
        }
    }
}
