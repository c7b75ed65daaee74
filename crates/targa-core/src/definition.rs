//! Model definitions: the declared schema of a typed record.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;
use crate::field::FieldDescriptor;
use crate::types::FieldType;

/// What construction does with mapping keys the model does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtraFields {
    /// Reject the mapping with `Error::UnexpectedField`.
    #[default]
    Forbid,
    /// Drop undeclared keys silently.
    Ignore,
}

/// Model-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Policy for undeclared keys.
    pub extra: ExtraFields,

    /// Disable coercions; values must already have the declared type.
    pub strict: bool,
}

impl ModelConfig {
    pub const fn new() -> Self {
        Self {
            extra: ExtraFields::Forbid,
            strict: false,
        }
    }

    pub const fn extra(mut self, extra: ExtraFields) -> Self {
        self.extra = extra;
        self
    }

    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// The declared schema of one model: its name, table, configuration and
/// ordered field descriptors.
///
/// Built once and never mutated. Field names are unique, valid identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    name: String,
    table_name: String,
    config: ModelConfig,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl ModelDefinition {
    /// Start declaring a model named `name`.
    pub fn builder(name: impl Into<String>) -> ModelDefinitionBuilder {
        ModelDefinitionBuilder {
            name: name.into(),
            table_name: None,
            config: ModelConfig::new(),
            fields: Vec::new(),
        }
    }

    /// Assemble a definition from already-declared parts.
    ///
    /// This is what `#[derive(Model)]` feeds through the registry. The same
    /// checks as [`ModelDefinitionBuilder::build`] apply.
    pub fn from_parts(
        name: &str,
        table_name: &str,
        config: ModelConfig,
        fields: &[FieldDescriptor],
    ) -> Result<Self> {
        let mut builder = Self::builder(name).table(table_name).config(config);
        builder.fields.extend_from_slice(fields);
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn config(&self) -> ModelConfig {
        self.config
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Declared `(name, type)` pairs in declaration order.
    pub fn descriptors(&self) -> Vec<(&str, FieldType)> {
        self.fields
            .iter()
            .map(|f| (f.name(), f.field_type))
            .collect()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Position of a field in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name of the primary-key field, if one is marked.
    pub fn primary_key(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.primary_key)
            .map(FieldDescriptor::name)
    }
}

/// Builder for [`ModelDefinition`].
#[derive(Debug, Clone)]
pub struct ModelDefinitionBuilder {
    name: String,
    table_name: Option<String>,
    config: ModelConfig,
    fields: Vec<FieldDescriptor>,
}

impl ModelDefinitionBuilder {
    /// Declare a non-nullable field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor::named(name, field_type));
        self
    }

    /// Declare a field that also accepts NULL.
    pub fn nullable_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields
            .push(FieldDescriptor::named(name, field_type).nullable(true));
        self
    }

    /// Declare a field from a complete descriptor.
    pub fn descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Override the default table name.
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn extra(mut self, extra: ExtraFields) -> Self {
        self.config.extra = extra;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Validate and freeze the definition.
    pub fn build(self) -> Result<ModelDefinition> {
        if !is_identifier(&self.name) {
            return Err(Error::InvalidDefinition {
                message: format!("'{}' is not a valid model name", self.name),
                model: self.name,
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_identifier(field.name()) {
                return Err(Error::InvalidDefinition {
                    model: self.name.clone(),
                    message: format!("'{}' is not a valid field name", field.name()),
                });
            }
            if !seen.insert(field.name()) {
                return Err(Error::DuplicateField {
                    model: self.name.clone(),
                    field: field.name().to_string(),
                });
            }
        }

        let index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().to_string(), i))
            .collect();
        let table_name = self
            .table_name
            .unwrap_or_else(|| default_table_name(&self.name));

        tracing::trace!(
            model = %self.name,
            table = %table_name,
            fields = self.fields.len(),
            "Model definition built"
        );

        Ok(ModelDefinition {
            name: self.name,
            table_name,
            config: self.config,
            fields: self.fields,
            index,
        })
    }
}

fn identifier_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
}

/// Is `name` usable as a model or field name?
pub fn is_identifier(name: &str) -> bool {
    match identifier_regex() {
        Some(re) => re.is_match(name),
        None => {
            let mut chars = name.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    }
}

/// Derive the default table name from a model name.
///
/// Inserts `_` before every non-initial uppercase letter, lowercases, then
/// appends `s` unless the result already ends in `s`.
///
/// `EventTeam` becomes `event_teams`; `Status` stays `status`.
pub fn default_table_name(model_name: &str) -> String {
    let mut out = String::with_capacity(model_name.len() + 4);
    for (i, c) in model_name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    if !out.ends_with('s') {
        out.push('s');
    }
    out
}
