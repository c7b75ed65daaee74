//! Field descriptors.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::types::FieldType;

/// One declared field of a model: the mapping key it is read from and the
/// type its value must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name; also the key looked up in a row mapping
    pub name: Cow<'static, str>,
    /// Declared semantic type
    pub field_type: FieldType,
    /// Whether NULL is an accepted value
    pub nullable: bool,
    /// Whether this is the primary key (informational)
    pub primary_key: bool,
}

impl FieldDescriptor {
    /// Create a descriptor for a non-nullable field.
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name: Cow::Borrowed(name),
            field_type,
            nullable: false,
            primary_key: false,
        }
    }

    /// Create a descriptor whose name is only known at runtime.
    pub fn named(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            field_type,
            nullable: false,
            primary_key: false,
        }
    }

    /// Set nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
