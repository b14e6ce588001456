use super::field::{ARRAY_FIELD, FieldDescriptor, SCALAR_FIELD};
use super::resolver::{SchemaResolver, schema_format, schema_type};
use ahash::AHashSet;
use serde_json::Value;

const OBJECT_TYPE: &str = "object";
const ARRAY_TYPE: &str = "array";

impl SchemaResolver<'_> {
    /// Flattens a schema into dotted-path field descriptors.
    ///
    /// * `oneOf`/`anyOf`: every branch is flattened and the results are unioned by
    ///   name (first branch wins); a declared discriminator missing from the union is
    ///   prepended as a string field.
    /// * objects: nested object properties become dotted paths; arrays are not
    ///   expanded and collapse to one `array` field whose format is the item type.
    /// * anything else: a single `"[]"` (sequence) or `"value"` (scalar) field.
    pub fn flatten_schema(&self, schema: Option<&Value>) -> Vec<FieldDescriptor> {
        let mut chain = Vec::new();
        let resolved = match schema {
            Some(schema) => self.resolve_in(schema, &mut chain),
            None => return Vec::new(),
        };
        self.flatten_root(&resolved, &mut chain)
    }

    fn flatten_root(&self, resolved: &Value, chain: &mut Vec<String>) -> Vec<FieldDescriptor> {
        if let Some(variants) = union_variants(resolved) {
            return self.flatten_union(resolved, variants, "", chain);
        }
        if is_object(resolved) {
            let fields = self.flatten_properties(resolved, "", chain);
            return with_discriminator(resolved, "", fields);
        }
        if schema_type(resolved).as_deref() == Some(ARRAY_TYPE) {
            let format = self.item_type(resolved, chain);
            return vec![FieldDescriptor::new(ARRAY_FIELD, ARRAY_TYPE).with_format(format)];
        }
        vec![
            FieldDescriptor::new(SCALAR_FIELD, leaf_type(resolved))
                .with_format(schema_format(resolved)),
        ]
    }

    fn flatten_properties(
        &self,
        schema: &Value,
        prefix: &str,
        chain: &mut Vec<String>,
    ) -> Vec<FieldDescriptor> {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut fields = Vec::new();
        for (name, prop) in properties {
            let path = join_path(prefix, name);
            let mark = chain.len();
            let resolved = self.resolve_in(prop, chain);

            if let Some(variants) = union_variants(&resolved) {
                fields.extend(self.flatten_union(&resolved, variants, &path, chain));
            } else if is_object(&resolved) && has_properties(&resolved) {
                fields.extend(self.flatten_properties(&resolved, &path, chain));
            } else if schema_type(&resolved).as_deref() == Some(ARRAY_TYPE) {
                let format = self.item_type(&resolved, chain);
                fields.push(FieldDescriptor::new(path, ARRAY_TYPE).with_format(format));
            } else {
                fields.push(
                    FieldDescriptor::new(path, leaf_type(&resolved))
                        .with_format(schema_format(&resolved)),
                );
            }
            chain.truncate(mark);
        }
        fields
    }

    fn flatten_union(
        &self,
        schema: &Value,
        variants: &[Value],
        prefix: &str,
        chain: &mut Vec<String>,
    ) -> Vec<FieldDescriptor> {
        let mut seen = AHashSet::new();
        let mut fields = Vec::new();

        for variant in variants {
            let mark = chain.len();
            let resolved = self.resolve_in(variant, chain);
            let flattened = if prefix.is_empty() {
                self.flatten_root(&resolved, chain)
            } else if let Some(nested) = union_variants(&resolved) {
                self.flatten_union(&resolved, nested, prefix, chain)
            } else if is_object(&resolved) && has_properties(&resolved) {
                self.flatten_properties(&resolved, prefix, chain)
            } else {
                vec![
                    FieldDescriptor::new(prefix, leaf_type(&resolved))
                        .with_format(schema_format(&resolved)),
                ]
            };
            chain.truncate(mark);

            for field in flattened {
                if seen.insert(field.name.clone()) {
                    fields.push(field);
                }
            }
        }
        with_discriminator(schema, prefix, fields)
    }

    fn item_type(&self, array: &Value, chain: &mut Vec<String>) -> Option<String> {
        let items = array.get("items")?;
        let mark = chain.len();
        let resolved = self.resolve_in(items, chain);
        chain.truncate(mark);
        schema_type(&resolved).or_else(|| is_object(&resolved).then(|| OBJECT_TYPE.to_string()))
    }
}

fn union_variants(schema: &Value) -> Option<&[Value]> {
    schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn is_object(schema: &Value) -> bool {
    match schema_type(schema) {
        Some(t) => t == OBJECT_TYPE,
        None => schema.get("properties").is_some(),
    }
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty())
}

fn leaf_type(schema: &Value) -> String {
    schema_type(schema).unwrap_or_else(|| OBJECT_TYPE.to_string())
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn with_discriminator(
    schema: &Value,
    prefix: &str,
    mut fields: Vec<FieldDescriptor>,
) -> Vec<FieldDescriptor> {
    let Some(property) = schema
        .get("discriminator")
        .and_then(|d| d.get("propertyName"))
        .and_then(Value::as_str)
    else {
        return fields;
    };
    let name = join_path(prefix, property);
    if fields.iter().any(|f| f.name == name) {
        return fields;
    }
    fields.insert(0, FieldDescriptor::new(name, "string"));
    fields
}
