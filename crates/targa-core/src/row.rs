//! Driver result rows, row mappings, and typed extraction.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A single result row keyed by column name.
///
/// This is what the model constructor consumes. When a row carries the same
/// column name twice, the later column wins.
pub type RowMapping = HashMap<String, Value>;

/// Column names shared by every row of one result set.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create column info from ordered column names.
    pub fn new(names: Vec<String>) -> Self {
        // Later duplicates overwrite earlier ones.
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned by the driver.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a row that owns its column metadata.
    ///
    /// Rows of one result set should share metadata through [`Row::with_columns`].
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            values,
            columns: Arc::new(ColumnInfo::new(column_names)),
        }
    }

    /// Create a row with shared column metadata.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get a typed value by column name.
    ///
    /// On failure the returned `TypeError` names the column.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
                rust_type: None,
            })
        })?;
        T::from_value(value).map_err(|e| with_column(e, name))
    }

    /// Iterate over (column_name, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Copy this row into a [`RowMapping`].
    pub fn to_mapping(&self) -> RowMapping {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// Consume this row into a [`RowMapping`] without cloning values.
    pub fn into_mapping(self) -> RowMapping {
        self.columns
            .names()
            .iter()
            .cloned()
            .zip(self.values)
            .collect()
    }
}

impl From<Row> for RowMapping {
    fn from(row: Row) -> Self {
        row.into_mapping()
    }
}

/// Attach a column name to a type error that lacks one.
pub(crate) fn with_column(err: Error, column: &str) -> Error {
    match err {
        Error::Type(mut te) => {
            if te.column.is_none() {
                te.column = Some(column.to_string());
            }
            Error::Type(te)
        }
        e => e,
    }
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
        rust_type: None,
    })
}

/// Trait for converting from a `Value` to a typed value.
pub trait FromValue: Sized {
    /// Convert from a Value, returning an error if the conversion fails.
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    let wide = match value {
                        Value::Bool(_) => None,
                        v => v.as_i64(),
                    }
                    .ok_or_else(|| mismatch(stringify!($ty), value))?;
                    <$ty>::try_from(wide).map_err(|_| {
                        Error::Type(TypeError {
                            expected: stringify!($ty),
                            actual: format!("value {} out of range", wide),
                            column: None,
                            rust_type: Some(stringify!($ty)),
                        })
                    })
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Double(v) => Ok(*v as f32),
            _ => Err(mismatch("f32", value)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(f64::from(*v)),
            Value::Double(v) => Ok(*v),
            _ => Err(mismatch("f64", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("String", value))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            _ => Err(mismatch("JSON", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_row() -> Row {
        Row::new(
            vec!["id".into(), "name".into(), "rating".into()],
            vec![
                Value::Int(7),
                Value::Text("Robots".into()),
                Value::Null,
            ],
        )
    }

    #[test]
    fn test_row_access() {
        let row = team_row();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0), Some(&Value::Int(7)));
        assert_eq!(row.get_by_name("name"), Some(&Value::Text("Robots".into())));
        assert_eq!(row.get_by_name("missing"), None);
        assert_eq!(row.get_named::<i64>("id").unwrap(), 7);
        assert_eq!(row.get_named::<Option<f64>>("rating").unwrap(), None);
    }

    #[test]
    fn test_get_named_error_names_column() {
        let row = team_row();
        let err = row.get_named::<i32>("name").unwrap_err();
        match err {
            Error::Type(te) => {
                assert_eq!(te.column.as_deref(), Some("name"));
                assert_eq!(te.actual, "TEXT");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_mapping() {
        let mapping = team_row().to_mapping();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping["id"], Value::Int(7));
        assert_eq!(mapping["rating"], Value::Null);
        assert_eq!(team_row().into_mapping(), mapping);
    }

    #[test]
    fn test_duplicate_column_last_wins() {
        let row = Row::new(
            vec!["id".into(), "id".into()],
            vec![Value::Int(1), Value::Int(2)],
        );
        assert_eq!(row.get_by_name("id"), Some(&Value::Int(2)));
        let mapping = row.to_mapping();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["id"], Value::Int(2));
    }

    #[test]
    fn test_shared_columns() {
        let first = team_row();
        let second = Row::with_columns(
            first.column_info(),
            vec![Value::Int(8), Value::Text("Gears".into()), Value::Double(1.5)],
        );
        assert!(Arc::ptr_eq(&first.column_info(), &second.column_info()));
        assert_eq!(second.get_named::<f64>("rating").unwrap(), 1.5);
    }

    #[test]
    fn test_integer_narrowing_is_range_checked() {
        assert_eq!(i8::from_value(&Value::BigInt(12)).unwrap(), 12);
        assert!(matches!(
            i8::from_value(&Value::BigInt(300)),
            Err(Error::Type(TypeError { ref actual, .. })) if actual.contains("out of range")
        ));
        assert!(u32::from_value(&Value::Int(-1)).is_err());
        assert_eq!(u64::from_value(&Value::Int(5)).unwrap(), 5);
    }

    #[test]
    fn test_integers_reject_bool_and_text() {
        assert!(i32::from_value(&Value::Bool(true)).is_err());
        assert!(i64::from_value(&Value::Text("1".into())).is_err());
    }

    #[test]
    fn test_from_value_other_types() {
        assert!(bool::from_value(&Value::Bool(true)).unwrap());
        assert_eq!(String::from_value(&Value::Decimal("1.10".into())).unwrap(), "1.10");
        assert_eq!(Vec::<u8>::from_value(&Value::Bytes(vec![1])).unwrap(), vec![1]);
        assert_eq!(
            serde_json::Value::from_value(&Value::Json(serde_json::json!([1]))).unwrap(),
            serde_json::json!([1])
        );
        assert_eq!(f32::from_value(&Value::Double(0.5)).unwrap(), 0.5);
        assert!(f64::from_value(&Value::Int(1)).is_err());
        assert_eq!(
            Option::<String>::from_value(&Value::Text("x".into())).unwrap(),
            Some("x".to_string())
        );
    }
}
