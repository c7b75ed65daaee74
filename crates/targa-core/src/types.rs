//! Declared field types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;

/// The semantic type a model declares for one of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Any width of signed integer
    Integer,
    /// Binary floating point
    Float,
    /// Exact decimal, carried as its textual form
    Decimal,
    Text,
    Boolean,
    Bytes,
    Json,
}

impl FieldType {
    /// The name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::Decimal => "DECIMAL",
            FieldType::Text => "TEXT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Bytes => "BYTES",
            FieldType::Json => "JSON",
        }
    }

    /// Parse a type name as written in `#[targa(field_type = "...")]`.
    ///
    /// Case-insensitive; accepts a few common SQL aliases.
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "integer" | "int" | "bigint" | "smallint" | "tinyint" => FieldType::Integer,
            "float" | "double" | "real" => FieldType::Float,
            "decimal" | "numeric" => FieldType::Decimal,
            "text" | "string" | "varchar" | "char" => FieldType::Text,
            "boolean" | "bool" => FieldType::Boolean,
            "bytes" | "blob" | "binary" | "varbinary" => FieldType::Bytes,
            "json" => FieldType::Json,
            _ => return None,
        };
        Some(ty)
    }

    /// Does `value` already have this type, with no coercion?
    pub const fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Integer => value.is_integer(),
            FieldType::Float => matches!(value, Value::Float(_) | Value::Double(_)),
            FieldType::Decimal => matches!(value, Value::Decimal(_)),
            FieldType::Text => matches!(value, Value::Text(_)),
            FieldType::Boolean => matches!(value, Value::Bool(_)),
            FieldType::Bytes => matches!(value, Value::Bytes(_)),
            FieldType::Json => matches!(value, Value::Json(_)),
        }
    }

    /// Convert `value` into this type where a permitted coercion exists.
    ///
    /// Returns `None` when the value is neither of this type nor coercible.
    /// Integers widen to `Double`, `TINYINT` 0/1 becomes `Bool`, and text
    /// holding a JSON document becomes `Json`.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        if self.matches(value) {
            return Some(value.clone());
        }
        match (self, value) {
            (FieldType::Float, v) if v.is_integer() => v.as_f64().map(Value::Double),
            (FieldType::Boolean, Value::TinyInt(0)) => Some(Value::Bool(false)),
            (FieldType::Boolean, Value::TinyInt(1)) => Some(Value::Bool(true)),
            (FieldType::Json, Value::Text(s)) => serde_json::from_str(s).ok().map(Value::Json),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
