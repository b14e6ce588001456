use super::pool::OutputPool;
use crate::config::RefineConfig;
use crate::document::{RequestInput, stringify_value};
use crate::matcher::names::{entity_candidates, normalize_name};
use crate::operation::OperationShape;
use crate::schema::{ARRAY_FIELD, SCALAR_FIELD};
use serde_json::{Map, Value};

/// Resolves a pooled value for one input name.
///
/// `<entity>Id` names try the entity's pooled `id` first, then the name itself
/// (exact or normalized), then any id-like value when the name ends in `id`.
pub fn resolve_from_pool<'p>(pool: &'p OutputPool, name: &str) -> Option<&'p Value> {
    let by_entity = entity_candidates(name)
        .iter()
        .find_map(|entity| pool.latest_entity(entity, "id"));
    if by_entity.is_some() {
        return by_entity;
    }

    if let Some(value) = pool.latest_normalized(name) {
        return Some(value);
    }

    if normalize_name(name).ends_with("id") {
        return pool.latest_id_like();
    }
    None
}

/// Builds the inputs of a `filled` call: the example inputs, overridden by every
/// value the pool can supply.
pub fn fill_inputs(
    operation: &OperationShape,
    pool: &OutputPool,
    example: &RequestInput,
    config: &RefineConfig,
) -> RequestInput {
    let mut input = example.clone();

    for field in &operation.request_fields {
        if let Some(value) = resolve_from_pool(pool, &field.name) {
            place_body_value(&mut input.body, &field.name, value.clone());
        }
    }

    for param in operation.params() {
        if let Some(value) = resolve_from_pool(pool, param.name()) {
            input
                .params
                .get_mut(param.location)
                .insert(param.name().to_string(), stringify_value(Some(value)));
        }
    }

    if operation.requires_auth {
        let token = pool.latest_token().map(|v| stringify_value(Some(v)));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            input
                .params
                .header
                .insert(config.bearer_header.clone(), config.bearer_value(&token));
        }
    }

    input
}

/// Writes `value` at a flattened field path, materializing intermediate objects.
pub fn place_body_value(body: &mut Option<Value>, path: &str, value: Value) {
    if path == ARRAY_FIELD || path == SCALAR_FIELD {
        *body = Some(value);
        return;
    }

    let root = body.get_or_insert_with(|| Value::Object(Map::new()));
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }

    let mut segments = path.split('.').peekable();
    let mut cursor = root;
    while let Some(segment) = segments.next() {
        let Value::Object(map) = cursor else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        let next = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !next.is_object() {
            *next = Value::Object(Map::new());
        }
        cursor = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn materializes_nested_objects() {
        let mut body = Some(json!({ "qty": 1, "address": "flat" }));
        place_body_value(&mut body, "address.city", json!("Oslo"));
        place_body_value(&mut body, "cart.owner.id", json!("u1"));
        assert_eq!(
            body,
            Some(json!({
                "qty": 1,
                "address": { "city": "Oslo" },
                "cart": { "owner": { "id": "u1" } }
            }))
        );
    }

    #[test]
    fn starts_from_empty_body() {
        let mut body = None;
        place_body_value(&mut body, "cartId", json!("cart_1"));
        assert_eq!(body, Some(json!({ "cartId": "cart_1" })));
    }
}
