//! Database abstraction layer.
//!
//! This module provides the persistence core:
//! - Connection pool management with reconnect ([`pool`])
//! - Parameterized query execution ([`executor`])
//! - Typed bind parameters ([`params`])
//! - Materialized result sets ([`result_set`])
//! - Entity registry and schema bootstrap ([`schema`])
//! - Versioned migrations and data seeds ([`migrations`])

#[macro_use]
pub mod macros;
pub mod executor;
pub mod migrations;
pub mod params;
pub mod pool;
pub mod result_set;
pub mod schema;
pub mod types;

pub use migrations::{Migration, Seed};
pub use params::SqlParam;
pub use pool::{DbPool, SqlConnector};
pub use result_set::StoredResultSet;
pub use schema::{ColumnDecl, ColumnType, EntityDeclaration, EntityRegistry};
