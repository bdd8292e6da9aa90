//! Query execution.
//!
//! [`SqlConnector::query`] is the single entry point the rest of the bot
//! uses: raw SQL with positional placeholders plus typed parameters in, a
//! materialized [`StoredResultSet`] (for SELECTs) or nothing (for writes)
//! out. A transient disconnect triggers at most one reconnect-and-retry per
//! call, and only once the connection has succeeded at least once.
//!
//! The database-specific implementations live in parallel submodules so the
//! differences between the engines stay obvious.

use crate::db::params::{SqlParam, bind_mysql_param, bind_sqlite_param};
use crate::db::pool::{DbPool, SqlConnector};
use crate::db::result_set::StoredResultSet;
use crate::db::types::RowCapture;
use crate::error::{DbError, DbResult};
use futures_util::StreamExt;
use tracing::{debug, error, warn};

impl SqlConnector {
    /// Execute `sql` with positional `params`.
    ///
    /// Returns `Ok(Some(_))` for statements starting with `SELECT`
    /// (case-insensitive), `Ok(None)` for completed writes and DDL, and
    /// `Err(_)` when the call did not complete. Callers must not read an
    /// error as "zero rows".
    pub async fn query(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<StoredResultSet>> {
        // At most one reconnect per call, whether it is spent on a dead
        // handle up front or on a disconnect mid-statement.
        let mut reconnect_spent = false;

        loop {
            if !self.is_connected().await {
                if !self.connected_once() {
                    warn!(sql, "Query refused: no connection has ever been established");
                    return Err(DbError::NeverConnected);
                }
                if reconnect_spent {
                    return Err(DbError::connection(
                        "Reconnect did not restore the database connection",
                    ));
                }
                warn!("Connection is down, attempting reconnect");
                self.connect().await;
                reconnect_spent = true;
                continue;
            }

            let Some(pool) = self.current_pool().await else {
                // The handle was replaced between the liveness check and the
                // fetch; next iteration goes through the reconnect gate.
                continue;
            };

            match run_statement(&pool, sql, params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_disconnect() && !reconnect_spent => {
                    warn!(error = %e, "Disconnect during statement, reconnecting once");
                    self.connect().await;
                    reconnect_spent = true;
                }
                Err(e) => {
                    error!(sql, params = ?params, error = %e, "Couldn't execute statement");
                    return Err(e);
                }
            }
        }
    }
}

/// True when the statement text starts with `SELECT`, ignoring leading
/// whitespace and case. Everything else runs as an update.
fn is_select(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .map(|prefix| prefix.eq_ignore_ascii_case("SELECT"))
        .unwrap_or(false)
}

async fn run_statement(
    pool: &DbPool,
    sql: &str,
    params: &[SqlParam],
) -> DbResult<Option<StoredResultSet>> {
    if is_select(sql) {
        let result = match pool {
            DbPool::MySql(p) => mysql::fetch_rows(p, sql, params).await?,
            DbPool::Sqlite(p) => sqlite::fetch_rows(p, sql, params).await?,
        };
        debug!(
            rows = result.row_count(),
            columns = result.column_count(),
            "Query captured"
        );
        Ok(Some(result))
    } else {
        let rows_affected = match pool {
            DbPool::MySql(p) => mysql::execute_write(p, sql, params).await?,
            DbPool::Sqlite(p) => sqlite::execute_write(p, sql, params).await?,
        };
        debug!(rows_affected, "Update executed");
        Ok(None)
    }
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

/// Materialize captured rows against the prepared statement's column list.
/// The statement metadata keeps column names correct for zero-row results.
fn materialize<R: RowCapture>(columns: Vec<String>, rows: Vec<R>) -> StoredResultSet {
    let grid = rows.iter().map(RowCapture::capture_values).collect();
    StoredResultSet::new(columns, grid)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database
// type. The code structure is intentionally parallel to make differences
// obvious.

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::{Column, Executor, Statement};

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<StoredResultSet> {
        let statement = pool.prepare(sql).await.map_err(DbError::from)?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>();

        let rows_future = if params.is_empty() {
            let stream = pool.fetch(sql);
            stream.collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_mysql_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.collect::<Vec<_>>()
        };

        let rows = collect_rows(rows_future.await)?;
        Ok(materialize(columns, rows))
    }

    pub async fn execute_write(
        pool: &MySqlPool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<u64> {
        // When params is empty, execute raw SQL directly to avoid prepared
        // statement issues (some DDL doesn't support prepared statements)
        let result = if params.is_empty() {
            pool.execute(sql).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_mysql_param(query, param);
            }
            query.execute(pool).await
        };

        result.map(|r| r.rows_affected()).map_err(DbError::from)
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::{Column, Executor, Statement};

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<StoredResultSet> {
        let statement = pool.prepare(sql).await.map_err(DbError::from)?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>();

        let rows_future = if params.is_empty() {
            let stream = pool.fetch(sql);
            stream.collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.collect::<Vec<_>>()
        };

        let rows = collect_rows(rows_future.await)?;
        Ok(materialize(columns, rows))
    }

    pub async fn execute_write(
        pool: &SqlitePool,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            pool.execute(sql).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_param(query, param);
            }
            query.execute(pool).await
        };

        result.map(|r| r.rows_affected()).map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_detection() {
        assert!(is_select("SELECT * FROM Opt_out"));
        assert!(is_select("select 1"));
        assert!(is_select("  \n\tSeLeCt GID FROM Opt_out"));
    }

    #[test]
    fn test_non_select_statements() {
        assert!(!is_select("INSERT INTO Opt_out (GID, UID) VALUES (?, ?)"));
        assert!(!is_select("UPDATE Opt_out SET UID = ?"));
        assert!(!is_select("CREATE TABLE IF NOT EXISTS Seeds (VERSION VARCHAR(100))"));
        assert!(!is_select(""));
        assert!(!is_select("SEL"));
    }
}
