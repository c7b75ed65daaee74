//! Validated model instances.

use std::fmt;

use crate::Result;
use crate::definition::ModelDefinition;
use crate::error::{Error, TypeError};
use crate::row::{FromValue, with_column};
use crate::value::Value;

/// An immutable record that conforms to one [`ModelDefinition`].
///
/// Produced only by [`build`](crate::construct::build). Holds exactly one
/// value per declared field, in declaration order, each of which satisfied
/// the declared type when the instance was built.
#[derive(Clone)]
pub struct ModelInstance<'d> {
    definition: &'d ModelDefinition,
    values: Vec<Value>,
}

impl<'d> ModelInstance<'d> {
    pub(crate) fn new(definition: &'d ModelDefinition, values: Vec<Value>) -> Self {
        debug_assert_eq!(definition.len(), values.len());
        Self { definition, values }
    }

    pub fn definition(&self) -> &'d ModelDefinition {
        self.definition
    }

    pub fn model_name(&self) -> &'d str {
        self.definition.name()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get an attribute by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.definition
            .position(name)
            .and_then(|i| self.values.get(i))
    }

    /// Get an attribute by declaration position.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a typed attribute by field name.
    #[allow(clippy::result_large_err)]
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("no field '{}' on {}", name, self.model_name()),
                column: Some(name.to_string()),
                rust_type: None,
            })
        })?;
        T::from_value(value).map_err(|e| with_column(e, name))
    }

    /// Iterate over (field_name, value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.definition
            .fields()
            .iter()
            .map(|f| f.name())
            .zip(self.values.iter())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Render the instance as a JSON object keyed by field name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl PartialEq for ModelInstance<'_> {
    fn eq(&self, other: &Self) -> bool {
        (std::ptr::eq(self.definition, other.definition) || self.definition == other.definition)
            && self.values == other.values
    }
}

impl fmt::Debug for ModelInstance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.model_name());
        for (name, value) in self.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

impl fmt::Display for ModelInstance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.model_name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}
