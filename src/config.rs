//! Configuration for the persistence layer.
//!
//! One [`DbConfig`] is parsed at process start (flags or environment) and
//! handed to the connector. It is never mutated afterwards.

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

/// Default maximum size of the connection pool.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Which database engine the bot stores its data in.
///
/// `embedded` and `sqlite` both keep a single file under the storage
/// directory; `mariadb` talks to a networked server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded file-based engine, the default when nothing is configured.
    #[value(name = "embedded")]
    Embedded,
    /// Single-file SQLite database.
    #[value(name = "sqlite")]
    Sqlite,
    /// Networked MariaDB/MySQL server.
    #[value(name = "mariadb")]
    MariaDb,
}

impl Dialect {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Sqlite => "sqlite",
            Self::MariaDb => "mariadb",
        }
    }

    /// True for the file-backed engines that need no host or credentials.
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Embedded | Self::Sqlite)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Immutable connection configuration, read once at startup.
#[derive(Clone, Parser, Serialize)]
#[command(name = "guilddb")]
pub struct DbConfig {
    /// Database engine to use.
    #[arg(long, env = "DB_DIALECT", value_enum, default_value_t = Dialect::Embedded)]
    pub dialect: Dialect,

    /// Database server host (mariadb only).
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    /// Database server port (mariadb only).
    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub port: u16,

    /// Database name. For file-based engines this names the storage file.
    #[arg(long, env = "DB_NAME", default_value = "guilddb")]
    pub database: String,

    /// Database user (mariadb only).
    #[arg(long, env = "DB_USER", default_value = "root")]
    pub user: String,

    /// Database password (mariadb only). Never logged.
    #[arg(long, env = "DB_PASSWORD", default_value = "")]
    #[serde(skip_serializing)]
    pub password: String,

    /// Maximum number of pooled connections.
    #[arg(long, env = "DB_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: u32,

    /// Directory holding file-based databases.
    #[arg(long, env = "DB_DATA_DIR", default_value = "storage")]
    pub data_dir: PathBuf,
}

impl DbConfig {
    /// Path of the database file for the file-based dialects.
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.database))
    }
}

// Manual Debug so the password can never leak into logs.
impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("pool_size", &self.pool_size)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(dialect: Dialect) -> DbConfig {
        DbConfig {
            dialect,
            host: "localhost".into(),
            port: 3306,
            database: "guilddb".into(),
            user: "root".into(),
            password: "secret".into(),
            pool_size: DEFAULT_POOL_SIZE,
            data_dir: PathBuf::from("storage"),
        }
    }

    #[test]
    fn test_sqlite_path_under_data_dir() {
        let config = config_with(Dialect::Sqlite);
        assert_eq!(config.sqlite_path(), PathBuf::from("storage/guilddb.db"));
    }

    #[test]
    fn test_file_based_dialects() {
        assert!(Dialect::Embedded.is_file_based());
        assert!(Dialect::Sqlite.is_file_based());
        assert!(!Dialect::MariaDb.is_file_based());
    }

    #[test]
    fn test_debug_masks_password() {
        let config = config_with(Dialect::MariaDb);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_serialize_skips_password() {
        let config = config_with(Dialect::MariaDb);
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["database"], "guilddb");
    }

    #[test]
    fn test_parse_defaults() {
        let config = DbConfig::parse_from(["guilddb"]);
        assert_eq!(config.dialect, Dialect::Embedded);
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.port, 3306);
    }
}
