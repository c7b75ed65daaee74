//! The model constructor: validates a row mapping against a definition.

use crate::Result;
use crate::definition::{ExtraFields, ModelDefinition};
use crate::error::Error;
use crate::instance::ModelInstance;
use crate::row::RowMapping;
use crate::value::Value;

/// Build a validated instance of `definition` from `mapping`.
///
/// Undeclared keys are checked first: under [`ExtraFields::Forbid`] the
/// lexicographically smallest one is reported, under [`ExtraFields::Ignore`]
/// they are dropped. Declared fields are then checked in declaration order
/// and the first failure is returned. Nothing is produced unless every field
/// passes.
#[allow(clippy::result_large_err)]
pub fn build<'d>(definition: &'d ModelDefinition, mapping: &RowMapping) -> Result<ModelInstance<'d>> {
    let config = definition.config();

    if config.extra == ExtraFields::Forbid {
        let unexpected = mapping
            .keys()
            .filter(|key| !definition.contains(key))
            .min();
        if let Some(key) = unexpected {
            tracing::debug!(model = %definition.name(), key = %key, "Rejected undeclared field");
            return Err(Error::UnexpectedField {
                model: definition.name().to_string(),
                key: key.clone(),
            });
        }
    }

    let mut values = Vec::with_capacity(definition.len());
    for field in definition.fields() {
        let Some(raw) = mapping.get(field.name()) else {
            tracing::debug!(model = %definition.name(), field = %field.name(), "Missing field");
            return Err(Error::MissingField {
                model: definition.name().to_string(),
                field: field.name().to_string(),
            });
        };

        let checked = if raw.is_null() {
            field.nullable.then_some(Value::Null)
        } else if config.strict {
            field.field_type.matches(raw).then(|| raw.clone())
        } else {
            field.field_type.coerce(raw)
        };

        match checked {
            Some(value) => values.push(value),
            None => {
                tracing::debug!(
                    model = %definition.name(),
                    field = %field.name(),
                    declared = %field.field_type,
                    actual = raw.type_name(),
                    "Field type mismatch"
                );
                return Err(Error::TypeMismatch {
                    model: definition.name().to_string(),
                    field: field.name().to_string(),
                    declared: field.field_type,
                    actual: raw.type_name(),
                });
            }
        }
    }

    tracing::trace!(model = %definition.name(), fields = values.len(), "Instance built");
    Ok(ModelInstance::new(definition, values))
}
