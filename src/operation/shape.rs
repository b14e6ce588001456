use crate::document::{HttpMethod, ParamLocation};
use crate::schema::{FieldDescriptor, ParamDescriptor};
use serde::{Deserialize, Serialize};

/// The normalized view of one operation that the matcher and the refinement loop work on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationShape {
    pub id: String,
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders.
    pub path: String,
    pub request_fields: Vec<FieldDescriptor>,
    pub response_fields: Vec<FieldDescriptor>,
    pub path_params: Vec<ParamDescriptor>,
    pub other_params: Vec<ParamDescriptor>,
    pub requires_auth: bool,
}

impl OperationShape {
    /// All parameters, path parameters first.
    pub fn params(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.path_params.iter().chain(self.other_params.iter())
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParamDescriptor> {
        self.params().filter(move |p| p.location == location)
    }

    pub fn response_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.response_fields.iter().find(|f| f.name == name)
    }
}
