use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// HTTP methods that may appear as keys of a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Parses a path-item key. Keys such as `parameters` or `summary` yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            "delete" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "patch" => Some(Self::Patch),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }

    /// Whether a request body is sent for this method.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared operation parameter. Schemas stay as raw JSON so `$ref` can be resolved later.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Value>,
    pub example: Option<Value>,
    /// A named map of examples or a plain array of values.
    pub examples: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBodyDefinition {
    pub content: Option<Map<String, Value>>,
    #[serde(default)]
    pub required: bool,
}

/// The subset of an operation object the engine reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDefinition {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    pub request_body: Option<RequestBodyDefinition>,
    pub responses: Option<Map<String, Value>>,
    pub security: Option<Vec<Map<String, Value>>>,
}

impl OperationDefinition {
    /// The schema of the request body's preferred media type, if any.
    pub fn request_schema(&self) -> Option<&Value> {
        let content = self.request_body.as_ref()?.content.as_ref()?;
        pick_media_type(content)?.get("schema")
    }

    /// The first response whose status code begins with `2`.
    pub fn success_response(&self) -> Option<(&str, &Value)> {
        self.responses
            .as_ref()?
            .iter()
            .find(|(code, _)| code.starts_with('2'))
            .map(|(code, response)| (code.as_str(), response))
    }

    /// The schema of the first 2xx response's preferred media type, if any.
    pub fn success_schema(&self) -> Option<&Value> {
        let (_, response) = self.success_response()?;
        let content = response.get("content")?.as_object()?;
        pick_media_type(content)?.get("schema")
    }

    pub fn has_security(&self) -> bool {
        self.security.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Selects `application/json`, then any `+json`/`json` media type, then the first declared one.
pub fn pick_media_type(content: &Map<String, Value>) -> Option<&Value> {
    content
        .get(JSON_MEDIA_TYPE)
        .or_else(|| {
            content
                .iter()
                .find(|(media, _)| media.to_ascii_lowercase().contains("json"))
                .map(|(_, value)| value)
        })
        .or_else(|| content.values().next())
}

/// One `(path, method)` entry of the document, in declaration order.
#[derive(Debug, Clone)]
pub struct OperationEntry {
    pub path: String,
    pub method: HttpMethod,
    pub definition: OperationDefinition,
}

impl OperationEntry {
    pub fn id(&self) -> String {
        self.definition
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method.as_upper(), self.path))
    }
}

/// A decoded API description.
///
/// The raw tree is kept so that `$ref` pointers can be followed anywhere in the document;
/// operation entries are decoded once, preserving the declaration order of paths and methods.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    raw: Value,
    operations: Vec<OperationEntry>,
}

impl ApiDocument {
    pub fn from_value(raw: Value) -> Result<Self, DocumentError> {
        let operations = decode_operations(&raw)?;
        Ok(Self { raw, operations })
    }

    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
        Self::from_value(super::loader::yaml_to_json(yaml))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The `openapi` version marker, when present and non-empty.
    pub fn version(&self) -> Option<&str> {
        self.raw
            .get("openapi")
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn path_count(&self) -> usize {
        self.raw
            .get("paths")
            .and_then(Value::as_object)
            .map_or(0, Map::len)
    }

    pub fn operations(&self) -> &[OperationEntry] {
        &self.operations
    }

    pub fn find_operation(&self, path: &str, method: HttpMethod) -> Option<&OperationEntry> {
        self.operations
            .iter()
            .find(|entry| entry.path == path && entry.method == method)
    }

    /// Follows an internal reference such as `#/components/schemas/Cart`.
    pub fn resolve_ref(&self, reference: &str) -> Option<&Value> {
        resolve_pointer(&self.raw, reference)
    }

    pub fn security_scheme(&self, name: &str) -> Option<&Value> {
        self.raw
            .get("components")?
            .get("securitySchemes")?
            .get(name)
    }

    /// Whether the named scheme is an HTTP bearer scheme.
    ///
    /// An undeclared scheme counts as bearer only under the conventional name `bearerAuth`.
    pub fn is_bearer_scheme(&self, name: &str) -> bool {
        match self.security_scheme(name) {
            Some(scheme) => {
                let kind = scheme.get("type").and_then(Value::as_str).unwrap_or("");
                let http_scheme = scheme.get("scheme").and_then(Value::as_str).unwrap_or("");
                kind.eq_ignore_ascii_case("http") && http_scheme.eq_ignore_ascii_case("bearer")
            }
            None => name == "bearerAuth",
        }
    }
}

fn decode_operations(raw: &Value) -> Result<Vec<OperationEntry>, DocumentError> {
    let Some(paths) = raw.get("paths").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared_params = decode_parameters(raw, item.get("parameters"), "*", path);

        for (key, value) in item {
            let Some(method) = HttpMethod::from_key(key) else {
                continue;
            };
            let Some(operation) = value.as_object() else {
                continue;
            };
            let mut definition = decode_operation(raw, operation, method, path)?;
            merge_shared_parameters(&mut definition, &shared_params);
            entries.push(OperationEntry {
                path: path.clone(),
                method,
                definition,
            });
        }
    }
    Ok(entries)
}

fn decode_operation(
    raw: &Value,
    operation: &Map<String, Value>,
    method: HttpMethod,
    path: &str,
) -> Result<OperationDefinition, DocumentError> {
    let mut object = operation.clone();
    let params = object.remove("parameters");
    if let Some(body) = object.get_mut("requestBody") {
        inline_ref(raw, body);
    }
    if let Some(Value::Object(responses)) = object.get_mut("responses") {
        for response in responses.values_mut() {
            inline_ref(raw, response);
        }
    }

    let mut definition: OperationDefinition = serde_json::from_value(Value::Object(object))
        .map_err(|e| DocumentError::MalformedOperation {
            method: method.as_upper().to_string(),
            path: path.to_string(),
            message: e.to_string(),
        })?;
    definition.parameters = decode_parameters(raw, params.as_ref(), method.as_upper(), path);
    Ok(definition)
}

/// Decodes a parameter list, following `$ref` entries. Entries that still fail to
/// decode are skipped with a warning.
fn decode_parameters(
    raw: &Value,
    params: Option<&Value>,
    method: &str,
    path: &str,
) -> Vec<ParameterDefinition> {
    let Some(params) = params else {
        return Vec::new();
    };
    let Some(items) = params.as_array() else {
        tracing::warn!(method, path, "Ignoring parameters that are not a list");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let decoded = follow_refs(raw, item)
                .ok_or_else(|| "unresolvable $ref".to_string())
                .and_then(|target| {
                    ParameterDefinition::deserialize(target).map_err(|e| e.to_string())
                });
            match decoded {
                Ok(param) => Some(param),
                Err(error) => {
                    tracing::warn!(method, path, error = %error, "Skipping undecodable parameter");
                    None
                }
            }
        })
        .collect()
}

/// Replaces a `$ref` node with a copy of its target, when it resolves.
fn inline_ref(raw: &Value, node: &mut Value) {
    if node.get("$ref").is_none() {
        return;
    }
    if let Some(target) = follow_refs(raw, node) {
        *node = target.clone();
    }
}

/// Follows a chain of `$ref` nodes; `None` when a link is missing or the chain loops.
fn follow_refs<'a>(raw: &'a Value, mut node: &'a Value) -> Option<&'a Value> {
    let mut seen: Vec<&str> = Vec::new();
    while let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if seen.contains(&reference) {
            return None;
        }
        seen.push(reference);
        node = resolve_pointer(raw, reference)?;
    }
    Some(node)
}

fn resolve_pointer<'a>(raw: &'a Value, reference: &str) -> Option<&'a Value> {
    let (_, pointer) = reference.split_once('#')?;
    if pointer.is_empty() {
        return Some(raw);
    }
    raw.pointer(pointer)
}

// Path-level parameters apply unless the operation redeclares the same (name, location).
fn merge_shared_parameters(definition: &mut OperationDefinition, shared: &[ParameterDefinition]) {
    let inherited: Vec<ParameterDefinition> = shared
        .iter()
        .filter(|p| {
            !definition
                .parameters
                .iter()
                .any(|own| own.name == p.name && own.location == p.location)
        })
        .cloned()
        .collect();
    if !inherited.is_empty() {
        let own = std::mem::take(&mut definition.parameters);
        definition.parameters = inherited.into_iter().chain(own).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operations_keep_declaration_order_and_skip_non_methods() {
        let doc = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/z": { "post": { "responses": {} }, "get": { "responses": {} } },
                "/a": { "summary": "ignored", "delete": { "responses": {} } }
            }
        }))
        .unwrap();

        let order: Vec<String> = doc.operations().iter().map(OperationEntry::id).collect();
        assert_eq!(order, vec!["POST /z", "GET /z", "DELETE /a"]);
    }

    #[test]
    fn path_level_parameters_are_inherited() {
        let doc = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/carts/{cartId}": {
                    "parameters": [{ "name": "cartId", "in": "path", "required": true }],
                    "get": { "responses": { "200": {} } }
                }
            }
        }))
        .unwrap();

        let params = &doc.operations()[0].definition.parameters;
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].location, ParamLocation::Path);
    }

    #[test]
    fn parameter_and_body_refs_are_followed() {
        let doc = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/carts/{cartId}": {
                    "parameters": [{ "$ref": "#/components/parameters/CartId" }],
                    "put": {
                        "parameters": [
                            { "$ref": "#/components/parameters/Page" },
                            { "$ref": "#/components/parameters/Missing" },
                            { "in": "query" }
                        ],
                        "requestBody": { "$ref": "#/components/requestBodies/CartBody" },
                        "responses": { "200": { "$ref": "#/components/responses/CartOk" } }
                    }
                }
            },
            "components": {
                "parameters": {
                    "CartId": { "name": "cartId", "in": "path", "required": true, "example": "cart_1" },
                    "Page": { "$ref": "#/components/parameters/PageNumber" },
                    "PageNumber": { "name": "page", "in": "query", "example": 2 }
                },
                "requestBodies": {
                    "CartBody": { "content": { "application/json": { "schema": { "type": "object" } } } }
                },
                "responses": {
                    "CartOk": { "content": { "application/json": { "schema": { "type": "string" } } } }
                }
            }
        }))
        .unwrap();

        let definition = &doc.operations()[0].definition;
        let names: Vec<&str> = definition.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["cartId", "page"]);
        assert_eq!(definition.request_schema(), Some(&json!({ "type": "object" })));
        assert_eq!(definition.success_schema(), Some(&json!({ "type": "string" })));
    }

    #[test]
    fn bearer_scheme_detection() {
        let doc = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "components": {
                "securitySchemes": {
                    "jwt": { "type": "http", "scheme": "Bearer" },
                    "apiKey": { "type": "apiKey", "in": "header", "name": "X-Key" }
                }
            }
        }))
        .unwrap();

        assert!(doc.is_bearer_scheme("jwt"));
        assert!(!doc.is_bearer_scheme("apiKey"));
        assert!(doc.is_bearer_scheme("bearerAuth"));
        assert!(!doc.is_bearer_scheme("other"));
    }
}
