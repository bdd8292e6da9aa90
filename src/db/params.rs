//! Typed bind parameters.
//!
//! Every argument handed to [`crate::db::SqlConnector::query`] is one of
//! these variants, so the wire type sent to the driver is always explicit
//! and an unmapped argument kind cannot exist at runtime.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};

/// A single positional query parameter with an explicit wire type.
///
/// Kind-to-wire mapping:
/// - `Text` -> VARCHAR
/// - `Blob` -> BLOB (driver-native bytes)
/// - `Int` -> INTEGER, `BigInt` -> BIGINT
/// - `Float` -> FLOAT, `Double` -> DOUBLE
/// - `Bool` -> BOOLEAN
/// - `Json` -> BLOB (serialized before binding)
/// - `Bytes` -> VARCHAR (base64 text, portable across engines with
///   inconsistent blob handling)
/// - `Timestamp` -> BIGINT (epoch milliseconds)
/// - `Null` -> SQL NULL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Text(String),
    Blob(Vec<u8>),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f32> for SqlParam {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<serde_json::Value> for SqlParam {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<u8>> for SqlParam {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

/// Serialize a JSON parameter to the bytes bound as a BLOB.
fn json_blob(v: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(v).unwrap_or_default()
}

/// Bind a parameter to a MariaDB/MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Text(v) => query.bind(v.as_str()),
        SqlParam::Blob(v) => query.bind(v.as_slice()),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::BigInt(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::Double(v) => query.bind(*v),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Json(v) => query.bind(json_blob(v)),
        SqlParam::Bytes(v) => query.bind(STANDARD.encode(v)),
        SqlParam::Timestamp(v) => query.bind(v.timestamp_millis()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Text(v) => query.bind(v.as_str()),
        SqlParam::Blob(v) => query.bind(v.as_slice()),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::BigInt(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::Double(v) => query.bind(*v),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Json(v) => query.bind(json_blob(v)),
        SqlParam::Bytes(v) => query.bind(STANDARD.encode(v)),
        SqlParam::Timestamp(v) => query.bind(v.timestamp_millis()),
    }
}
