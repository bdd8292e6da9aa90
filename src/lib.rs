//! guilddb - persistence core for a Discord community bot.
//!
//! This library owns the database side of the bot: a pooled connection with
//! automatic reconnect, a parameterized query executor returning fully
//! materialized result sets, a registry-driven schema bootstrap, and
//! versioned migrations/seeds. Everything above it (commands, games, embeds)
//! talks to this layer through [`db::SqlConnector::query`].

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use config::{DbConfig, Dialect};
pub use db::{EntityRegistry, SqlConnector, SqlParam, StoredResultSet};
pub use error::{DbError, DbResult};
