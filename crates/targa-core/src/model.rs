//! The `Model` trait for typed row records.
//!
//! Implemented by `#[derive(Model)]`. A model declares its fields once; the
//! registry turns that declaration into a [`ModelDefinition`], and every typed
//! construction goes through the model constructor before the struct is filled.

use crate::Result;
use crate::construct::build;
use crate::definition::{ModelConfig, ModelDefinition};
use crate::field::FieldDescriptor;
use crate::instance::ModelInstance;
use crate::registry;
use crate::row::{Row, RowMapping};

/// A typed record whose fields are validated on construction.
///
/// # Example
///
/// ```ignore
/// use targa::prelude::*;
///
/// #[derive(Model, Debug)]
/// struct Team {
///     #[targa(primary_key)]
///     id: i64,
///     name: String,
///     rating: Option<f64>,
/// }
///
/// let team = Team::from_mapping(&mapping)?;
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// The model's name, used in errors.
    const MODEL_NAME: &'static str;

    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// Declared fields in declaration order.
    fn fields() -> &'static [FieldDescriptor];

    /// Fill the struct from an instance already validated against
    /// [`Model::definition`].
    #[allow(clippy::result_large_err)]
    fn from_instance(instance: &ModelInstance<'_>) -> Result<Self>;

    /// Get the model configuration.
    fn config() -> ModelConfig {
        ModelConfig::new()
    }

    /// The model's definition, derived once per process.
    #[allow(clippy::result_large_err)]
    fn definition() -> Result<&'static ModelDefinition> {
        registry::definition_of::<Self>()
    }

    /// Validate a row mapping and build the typed record.
    #[allow(clippy::result_large_err)]
    fn from_mapping(mapping: &RowMapping) -> Result<Self> {
        let instance = build(Self::definition()?, mapping)?;
        Self::from_instance(&instance)
    }

    /// Validate a driver row and build the typed record.
    #[allow(clippy::result_large_err)]
    fn from_row(row: &Row) -> Result<Self> {
        Self::from_mapping(&row.to_mapping())
    }
}
