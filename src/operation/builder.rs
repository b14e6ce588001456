use super::shape::OperationShape;
use crate::document::{ApiDocument, OperationEntry, ParamLocation, ParameterDefinition};
use crate::schema::{
    FieldDescriptor, ParamDescriptor, SchemaResolver, schema_entity, schema_format, schema_type,
};

const DEFAULT_PARAM_TYPE: &str = "string";

/// Turns a document into the list of operation shapes, in declaration order.
///
/// Pure and deterministic: the same document always yields the same shapes.
pub struct OperationModelBuilder<'a> {
    document: &'a ApiDocument,
    resolver: SchemaResolver<'a>,
}

impl<'a> OperationModelBuilder<'a> {
    pub fn new(document: &'a ApiDocument) -> Self {
        Self {
            document,
            resolver: SchemaResolver::new(document),
        }
    }

    pub fn build(&self) -> Vec<OperationShape> {
        self.document
            .operations()
            .iter()
            .filter(|entry| {
                entry
                    .definition
                    .responses
                    .as_ref()
                    .is_some_and(|r| !r.is_empty())
            })
            .map(|entry| self.build_shape(entry))
            .collect()
    }

    fn build_shape(&self, entry: &OperationEntry) -> OperationShape {
        let op = &entry.definition;

        let request_schema = op.request_schema();
        let request_fields = self.tagged_fields(request_schema);
        // No 2xx response means no response fields at all.
        let response_fields = match op.success_response() {
            Some(_) => self.tagged_fields(op.success_schema()),
            None => Vec::new(),
        };

        let (path_params, other_params): (Vec<_>, Vec<_>) = op
            .parameters
            .iter()
            .map(|param| self.param_descriptor(param))
            .partition(|param| param.location == ParamLocation::Path);

        OperationShape {
            id: entry.id(),
            method: entry.method,
            path: entry.path.clone(),
            request_fields,
            response_fields,
            path_params,
            other_params,
            requires_auth: self.requires_bearer(entry),
        }
    }

    fn tagged_fields(&self, schema: Option<&serde_json::Value>) -> Vec<FieldDescriptor> {
        if schema.is_none() {
            return Vec::new();
        }
        let entity = schema_entity(schema);
        self.resolver
            .flatten_schema(schema)
            .into_iter()
            .map(|field| field.with_entity(entity.clone()))
            .collect()
    }

    fn param_descriptor(&self, param: &ParameterDefinition) -> ParamDescriptor {
        let (field_type, format) = match &param.schema {
            Some(schema) => {
                let resolved = self.resolver.resolve_schema(Some(schema));
                (
                    schema_type(&resolved).unwrap_or_else(|| DEFAULT_PARAM_TYPE.to_string()),
                    schema_format(&resolved),
                )
            }
            None => (DEFAULT_PARAM_TYPE.to_string(), None),
        };

        ParamDescriptor {
            field: FieldDescriptor::new(param.name.clone(), field_type).with_format(format),
            location: param.location,
        }
    }

    fn requires_bearer(&self, entry: &OperationEntry) -> bool {
        entry
            .definition
            .security
            .iter()
            .flatten()
            .flat_map(|requirement| requirement.keys())
            .any(|scheme| self.document.is_bearer_scheme(scheme))
    }
}

/// Convenience wrapper around [`OperationModelBuilder`].
pub fn build_operations(document: &ApiDocument) -> Vec<OperationShape> {
    OperationModelBuilder::new(document).build()
}
