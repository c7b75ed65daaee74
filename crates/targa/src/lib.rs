//! Targa - a lightweight async MySQL library with typed, validated row models.
//!
//! Targa sits on top of asupersync's MySQL client and adds three things:
//!
//! - `Database`, a connection wrapper with `?` parameters, ping-before-query
//!   and a single reconnect-and-retry on connection loss
//! - `query`, which returns each row as a mapping of column name to value
//! - `#[derive(Model)]`, which declares a typed row model whose construction
//!   checks every field against its declared type
//!
//! # Quick Start
//!
//! ```ignore
//! use targa::prelude::*;
//!
//! #[derive(Model, Debug)]
//! struct EventTeam {
//!     #[targa(primary_key)]
//!     id: i64,
//!     event_key: String,
//!     team_number: i32,
//!     rank: Option<i32>,
//! }
//!
//! async fn ranked(cx: &Cx) -> Outcome<Vec<EventTeam>, Error> {
//!     let config = match MySqlConfig::from_env() {
//!         Ok(config) => config,
//!         Err(e) => return Outcome::Err(e),
//!     };
//!     let db = match Database::connect(cx, config).await {
//!         Outcome::Ok(db) => db,
//!         Outcome::Err(e) => return Outcome::Err(e),
//!         Outcome::Cancelled(r) => return Outcome::Cancelled(r),
//!         Outcome::Panicked(p) => return Outcome::Panicked(p),
//!     };
//!     db.query_as::<EventTeam>(
//!         cx,
//!         "SELECT id, event_key, team_number, rank FROM event_teams WHERE event_key = ?",
//!         &[Value::from("2024casj")],
//!     )
//!     .await
//! }
//! ```
//!
//! Models can also be declared at runtime with
//! [`ModelDefinition::builder`] and validated with [`build`], which yields an
//! untyped [`ModelInstance`].
//!
//! The derive expands to paths under `targa_core`, so crates deriving
//! `Model` also depend on `targa-core`.

pub use targa_core::{
    ColumnInfo, ConfigError, Connection, ConnectionError, ConnectionErrorKind, Cx, Error,
    ExtraFields, FieldDescriptor, FieldType, FromValue, Model, ModelConfig, ModelDefinition,
    ModelDefinitionBuilder, ModelInstance, Outcome, QueryError, QueryErrorKind, Result, Row,
    RowMapping, TypeError, Value, build, default_table_name, definition_of, is_identifier,
};
pub use targa_macros::Model;

pub mod config;
pub mod database;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod params;

pub use config::{DATABASE_URL_ENV, DatabaseOptions, MySqlConfig, SslMode};
pub use database::Database;
#[cfg(feature = "mysql")]
pub use mysql::MySqlClient;

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        Connection, Cx, Database, DatabaseOptions, Error, ExtraFields, FieldType, Model,
        ModelConfig, ModelDefinition, ModelInstance, MySqlConfig, Outcome, Result, Row,
        RowMapping, Value, build,
    };
}
