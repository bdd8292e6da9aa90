//! Entity declarations and schema bootstrap.
//!
//! Tables are declared through an explicit registry built once at startup:
//! each persistable type registers its table name and ordered column list,
//! and [`SqlConnector::create_tables`] turns every declaration into a
//! `CREATE TABLE IF NOT EXISTS`. Three fixed bookkeeping tables (opt-outs,
//! applied migrations, applied seeds) are always created first.

use crate::db::pool::SqlConnector;
use serde::Serialize;
use tracing::{error, info};

/// Table tracking users who opted out of data collection.
pub const OPT_OUT_TABLE: &str = "Opt_out";
/// Table tracking applied migrations by name.
pub const MIGRATIONS_TABLE: &str = "Migrations";
/// Table tracking applied data seeds by version.
pub const SEEDS_TABLE: &str = "Seeds";

/// Fixed bookkeeping tables created on every startup, name plus column list.
const BOOKKEEPING_TABLES: [(&str, &str); 3] = [
    (OPT_OUT_TABLE, "(GID VARCHAR(40), UID VARCHAR(40))"),
    (MIGRATIONS_TABLE, "(NAME VARCHAR(100), DATE VARCHAR(100))"),
    (SEEDS_TABLE, "(VERSION VARCHAR(100), DATE VARCHAR(100))"),
];

/// SQL type of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Varchar(u32),
    Text,
    Integer,
    BigInt,
    Float,
    Double,
    Boolean,
    Blob,
}

impl ColumnType {
    fn sql(&self) -> String {
        match self {
            Self::Varchar(len) => format!("VARCHAR({})", len),
            Self::Text => "TEXT".into(),
            Self::Integer => "INTEGER".into(),
            Self::BigInt => "BIGINT".into(),
            Self::Float => "FLOAT".into(),
            Self::Double => "DOUBLE".into(),
            Self::Boolean => "BOOLEAN".into(),
            Self::Blob => "BLOB".into(),
        }
    }
}

/// One column of an entity table.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDecl {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
}

impl ColumnDecl {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    fn sql(&self) -> String {
        let mut ddl = format!("{} {}", self.name, self.column_type.sql());
        if self.primary_key {
            ddl.push_str(" PRIMARY KEY");
        }
        if self.not_null && !self.primary_key {
            ddl.push_str(" NOT NULL");
        }
        ddl
    }
}

/// Declaration of a persistable type: table name plus ordered column list.
/// Read-only once registered.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDeclaration {
    pub table: String,
    pub columns: Vec<ColumnDecl>,
}

impl EntityDeclaration {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDecl>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Render the `CREATE TABLE IF NOT EXISTS` statement for this entity.
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDecl::sql)
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table, columns)
    }
}

/// Registry of every entity declaration, built once before startup.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<EntityDeclaration>,
}

impl EntityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the bot's built-in entities.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(EntityDeclaration::new(
            OPT_OUT_TABLE,
            vec![
                ColumnDecl::new("GID", ColumnType::Varchar(40)),
                ColumnDecl::new("UID", ColumnType::Varchar(40)),
            ],
        ));
        registry
    }

    /// Register an entity declaration.
    pub fn register(&mut self, entity: EntityDeclaration) {
        self.entities.push(entity);
    }

    /// All registered declarations, in registration order.
    pub fn entities(&self) -> &[EntityDeclaration] {
        &self.entities
    }
}

impl SqlConnector {
    /// Create the bookkeeping tables and every registered entity table if
    /// they are missing. Skipped entirely when no connection is open.
    ///
    /// A failure for one table is logged and does not stop the remaining
    /// tables from being attempted; partial schema creation surfaces only
    /// through the logs.
    pub async fn create_tables(&self, registry: &EntityRegistry) {
        if !self.is_connected().await {
            return;
        }

        for (name, columns) in BOOKKEEPING_TABLES {
            let ddl = format!("CREATE TABLE IF NOT EXISTS {}{}", name, columns);
            if let Err(e) = self.query(&ddl, &[]).await {
                error!(table = name, error = %e, "Couldn't create bookkeeping table");
            }
        }

        for entity in registry.entities() {
            info!(table = %entity.table, "Creating table");
            if let Err(e) = self.query(&entity.create_table_sql(), &[]).await {
                error!(table = %entity.table, error = %e, "Couldn't create table");
            }
        }
    }
}
