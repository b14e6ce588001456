use crate::document::ParamLocation;
use serde::{Deserialize, Serialize};

/// Field name used when a schema flattens to a bare top-level sequence.
pub const ARRAY_FIELD: &str = "[]";
/// Field name used when a schema flattens to a bare scalar.
pub const SCALAR_FIELD: &str = "value";

/// One leaf of a flattened schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Dotted path, e.g. `address.city`.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Name of the named schema the field was flattened from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            format: None,
            entity: None,
        }
    }

    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format;
        self
    }

    pub fn with_entity(mut self, entity: Option<String>) -> Self {
        self.entity = entity;
        self
    }
}

/// A declared parameter projected onto a field, plus where it travels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDescriptor {
    #[serde(flatten)]
    pub field: FieldDescriptor,
    pub location: ParamLocation,
}

impl ParamDescriptor {
    pub fn name(&self) -> &str {
        &self.field.name
    }
}
