use super::definition::{OperationDefinition, ParamLocation, ParameterDefinition, pick_media_type};
use serde_json::Value;
use std::collections::BTreeMap;

/// Example parameter values keyed by location, all already stringified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    pub path: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub header: BTreeMap<String, String>,
    pub cookie: BTreeMap<String, String>,
}

impl ParamValues {
    pub fn get_mut(&mut self, location: ParamLocation) -> &mut BTreeMap<String, String> {
        match location {
            ParamLocation::Path => &mut self.path,
            ParamLocation::Query => &mut self.query,
            ParamLocation::Header => &mut self.header,
            ParamLocation::Cookie => &mut self.cookie,
        }
    }
}

/// Concrete inputs for one call: a body plus stringified parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInput {
    pub body: Option<Value>,
    pub params: ParamValues,
}

/// Extracts the example request body and parameter values for an operation.
///
/// Missing examples are simply absent; this never fails.
pub fn extract_example_inputs(definition: &OperationDefinition) -> RequestInput {
    let mut params = ParamValues::default();
    for param in &definition.parameters {
        let value = param_example(param);
        params
            .get_mut(param.location)
            .insert(param.name.clone(), stringify_value(value.as_ref()));
    }

    RequestInput {
        body: request_example(definition),
        params,
    }
}

/// Explicit value first, else the first entry of `examples` (unwrapping `value`).
fn pick_example(value: Option<&Value>, examples: Option<&Value>) -> Option<Value> {
    if let Some(value) = value {
        return Some(value.clone());
    }
    match first_example(examples?)? {
        Value::Object(obj) if obj.contains_key("value") => obj.get("value").cloned(),
        other => Some(other.clone()),
    }
}

/// First entry of an `examples` collection: a named map, or a JSON Schema style array.
fn first_example(examples: &Value) -> Option<&Value> {
    match examples {
        Value::Object(named) => named.values().next(),
        Value::Array(items) => items.first(),
        _ => None,
    }
}

/// Whether an `examples` collection holds at least one entry.
pub(crate) fn has_example_entries(examples: &Value) -> bool {
    first_example(examples).is_some()
}

fn pick_from_node(node: &Value) -> Option<Value> {
    pick_example(node.get("example"), node.get("examples"))
}

fn param_example(param: &ParameterDefinition) -> Option<Value> {
    pick_example(param.example.as_ref(), param.examples.as_ref())
        .or_else(|| param.schema.as_ref().and_then(pick_from_node))
}

fn request_example(definition: &OperationDefinition) -> Option<Value> {
    let content = definition.request_body.as_ref()?.content.as_ref()?;
    let media = pick_media_type(content)?;
    pick_from_node(media).or_else(|| media.get("schema").and_then(pick_from_node))
}

/// Text form of a JSON value as it travels in a path, query, header or cookie.
///
/// Strings are taken as-is, null or absent become empty, composites become JSON text.
pub fn stringify_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}
