//! Core types and traits for Targa.
//!
//! This crate provides the pieces every Targa model is built from:
//!
//! - `Value` and `Row` for dynamically typed driver results
//! - `ModelDefinition` and the definition registry
//! - `build`, the model constructor that validates a row mapping
//! - `Model` trait for typed records
//! - `Connection` trait for the underlying driver
//! - `Outcome` and `Cx` re-exported from asupersync

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod construct;
pub mod definition;
pub mod error;
pub mod field;
pub mod instance;
pub mod model;
pub mod registry;
pub mod row;
pub mod types;
pub mod value;

pub use connection::Connection;
pub use construct::build;
pub use definition::{
    ExtraFields, ModelConfig, ModelDefinition, ModelDefinitionBuilder, default_table_name,
    is_identifier,
};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result,
    TypeError,
};
pub use field::FieldDescriptor;
pub use instance::ModelInstance;
pub use model::Model;
pub use registry::definition_of;
pub use row::{ColumnInfo, FromValue, Row, RowMapping};
pub use types::FieldType;
pub use value::Value;
