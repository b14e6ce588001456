use crate::document::ApiDocument;
use serde_json::{Map, Value, json};

/// Resolves `$ref` and `allOf` composition against one document.
///
/// Every public entry point starts a fresh reference chain. A `$ref` already on the
/// chain is a cycle: resolution stops there and yields an empty object schema.
pub struct SchemaResolver<'a> {
    document: &'a ApiDocument,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(document: &'a ApiDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &'a ApiDocument {
        self.document
    }

    /// Follows `$ref` and merges `allOf`. `oneOf`/`anyOf` are left untouched.
    pub fn resolve_schema(&self, schema: Option<&Value>) -> Value {
        let mut chain = Vec::new();
        match schema {
            Some(schema) => self.resolve_in(schema, &mut chain),
            None => empty_object(),
        }
    }

    /// Resolves `schema`, pushing every reference it follows onto `chain`.
    ///
    /// Callers truncate `chain` once they are done expanding the resolved node.
    pub(super) fn resolve_in(&self, schema: &Value, chain: &mut Vec<String>) -> Value {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            if chain.iter().any(|seen| seen == reference) {
                tracing::debug!(reference, "Schema reference cycle cut");
                return empty_object();
            }
            chain.push(reference.to_string());
            return match self.document.resolve_ref(reference) {
                Some(target) => self.resolve_in(target, chain),
                None => empty_object(),
            };
        }
        if let Some(branches) = schema.get("allOf").and_then(Value::as_array) {
            return self.merge_all_of(branches, chain);
        }
        schema.clone()
    }

    fn merge_all_of(&self, branches: &[Value], chain: &mut Vec<String>) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for branch in branches {
            let mark = chain.len();
            let resolved = self.resolve_in(branch, chain);
            chain.truncate(mark);

            if let Some(props) = resolved.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    // Later branches win on name collisions.
                    properties.insert(name.clone(), prop.clone());
                }
            }
            if let Some(names) = resolved.get("required").and_then(Value::as_array) {
                required.extend(names.iter().cloned());
            }
        }

        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": Value::Array(required),
        })
    }
}

/// The named schema a node refers to, e.g. `Cart` for `#/components/schemas/Cart`.
pub fn schema_entity(schema: Option<&Value>) -> Option<String> {
    let reference = schema?.get("$ref")?.as_str()?;
    reference
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// The declared primitive type; for a type list the first non-`null` entry.
pub fn schema_type(schema: &Value) -> Option<String> {
    match schema.get("type")? {
        Value::String(t) => Some(t.clone()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(str::to_string),
        _ => None,
    }
}

pub fn schema_format(schema: &Value) -> Option<String> {
    schema.get("format").and_then(Value::as_str).map(str::to_string)
}

fn empty_object() -> Value {
    json!({ "type": "object" })
}
