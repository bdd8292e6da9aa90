//! Versioned migrations and data seeds.
//!
//! Units run in declared order, exactly once each: a unit already recorded
//! in its bookkeeping table is skipped, a unit whose statements all succeed
//! is recorded with a timestamp, and a failing unit is logged and left
//! unrecorded so the next startup retries it. One failing unit does not stop
//! the ones after it.

use crate::db::pool::SqlConnector;
use crate::db::schema::{MIGRATIONS_TABLE, SEEDS_TABLE};
use crate::error::DbResult;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, error, info};

/// A named, ordered schema migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub name: String,
    pub statements: Vec<String>,
}

impl Migration {
    pub fn new(name: impl Into<String>, statements: &[&str]) -> Self {
        Self {
            name: name.into(),
            statements: statements.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A versioned data seed.
#[derive(Debug, Clone)]
pub struct Seed {
    pub version: String,
    pub statements: Vec<String>,
}

impl Seed {
    pub fn new(version: impl Into<String>, statements: &[&str]) -> Self {
        Self {
            version: version.into(),
            statements: statements.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Apply every migration not yet recorded in the `Migrations` table.
///
/// Returns an error only when the bookkeeping table itself cannot be read;
/// per-unit failures are logged and isolated.
pub async fn run_migrations(connector: &SqlConnector, migrations: &[Migration]) -> DbResult<()> {
    let applied = applied_units(connector, &format!("SELECT NAME FROM {}", MIGRATIONS_TABLE)).await?;

    for migration in migrations {
        if applied.contains(&migration.name) {
            debug!(name = %migration.name, "Migration already applied, skipping");
            continue;
        }

        info!(name = %migration.name, "Applying migration");
        if !apply_statements(connector, &migration.statements).await {
            error!(
                name = %migration.name,
                "Migration failed and stays pending, it will be retried on next startup"
            );
            continue;
        }

        let record = format!("INSERT INTO {} (NAME, DATE) VALUES (?, ?)", MIGRATIONS_TABLE);
        match connector
            .query(&record, &params![migration.name.clone(), Utc::now().to_rfc3339()])
            .await
        {
            Ok(_) => info!(name = %migration.name, "Migration applied"),
            Err(e) => error!(name = %migration.name, error = %e, "Couldn't record migration"),
        }
    }

    Ok(())
}

/// Apply every seed not yet recorded in the `Seeds` table.
pub async fn run_seeds(connector: &SqlConnector, seeds: &[Seed]) -> DbResult<()> {
    let applied = applied_units(connector, &format!("SELECT VERSION FROM {}", SEEDS_TABLE)).await?;

    for seed in seeds {
        if applied.contains(&seed.version) {
            debug!(version = %seed.version, "Seed already applied, skipping");
            continue;
        }

        info!(version = %seed.version, "Applying seed");
        if !apply_statements(connector, &seed.statements).await {
            error!(
                version = %seed.version,
                "Seed failed and stays pending, it will be retried on next startup"
            );
            continue;
        }

        let record = format!("INSERT INTO {} (VERSION, DATE) VALUES (?, ?)", SEEDS_TABLE);
        match connector
            .query(&record, &params![seed.version.clone(), Utc::now().to_rfc3339()])
            .await
        {
            Ok(_) => info!(version = %seed.version, "Seed applied"),
            Err(e) => error!(version = %seed.version, error = %e, "Couldn't record seed"),
        }
    }

    Ok(())
}

/// Read the set of already-recorded unit names/versions. Column 1 of the
/// projection is the identifier.
async fn applied_units(connector: &SqlConnector, sql: &str) -> DbResult<HashSet<String>> {
    let result = connector.query(sql, &[]).await?.unwrap_or_default();

    let mut applied = HashSet::with_capacity(result.row_count());
    for row in 1..=result.row_count() {
        if let Some(name) = result.value(row, 1).and_then(|v| v.as_str()) {
            applied.insert(name.to_string());
        }
    }
    Ok(applied)
}

/// Run a unit's statements in order. The unit only counts as applied when
/// every statement succeeds.
async fn apply_statements(connector: &SqlConnector, statements: &[String]) -> bool {
    for statement in statements {
        if let Err(e) = connector.query(statement, &[]).await {
            error!(sql = %statement, error = %e, "Unit statement failed");
            return false;
        }
    }
    true
}
