use super::evidence::{Evidence, EvidenceStore, value_at_path};
use crate::config::RefineConfig;
use crate::document::stringify_value;
use crate::matcher::names::{is_token_like, normalize_name};
use crate::matcher::{Dependency, DependencyKind, MatchReason, Verification};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Checks one candidate edge against the best evidence of both operations.
///
/// Verified iff both sides succeeded, both values resolve to non-empty text and
/// the texts are equal.
pub fn verify_dependency(
    dependency: &Dependency,
    store: &EvidenceStore,
    config: &RefineConfig,
) -> Verification {
    let (Some(from), Some(to)) = (
        store.best(&dependency.from_operation),
        store.best(&dependency.to_operation),
    ) else {
        return Verification::Unverified;
    };
    if !from.ok || !to.ok {
        return Verification::Unverified;
    }

    let provider = provider_value(dependency, from).map(|v| stringify_value(Some(&v)));
    let consumer = consumer_value(dependency, to, config);

    match (provider, consumer) {
        (Some(p), Some(c)) if !p.is_empty() && !c.is_empty() && p == c => Verification::Verified,
        _ => Verification::Unverified,
    }
}

fn provider_value(dependency: &Dependency, from: &Evidence) -> Option<Value> {
    let response = &from.response;
    let value = match (dependency.kind, dependency.reason) {
        (DependencyKind::Auth, _) => response
            .iter()
            .find(|(key, _)| is_token_like(key))
            .map(|(_, v)| v),
        (_, MatchReason::EntityId) => response
            .get("id")
            .or_else(|| find_normalized(response, "id")),
        _ => response
            .get(&dependency.source_field)
            .or_else(|| find_normalized(response, &dependency.source_field)),
    };
    value.cloned()
}

fn consumer_value(dependency: &Dependency, to: &Evidence, config: &RefineConfig) -> Option<String> {
    let request = &to.request;
    let field = dependency.field.as_str();
    match dependency.kind {
        DependencyKind::Auth => request
            .header
            .get(&config.bearer_header.to_ascii_lowercase())
            .and_then(|v| config.strip_bearer(v))
            .map(str::to_string),
        DependencyKind::Body => request
            .body
            .as_ref()
            .and_then(|body| value_at_path(body, field))
            .map(|v| stringify_value(Some(v))),
        DependencyKind::Path => lookup_param(&request.path, field),
        DependencyKind::Query => lookup_param(&request.query, field),
        DependencyKind::Cookie => lookup_param(&request.cookie, field),
        DependencyKind::Header => request.header.get(&field.to_ascii_lowercase()).cloned(),
    }
}

fn find_normalized<'m>(map: &'m Map<String, Value>, name: &str) -> Option<&'m Value> {
    let target = normalize_name(name);
    map.iter()
        .find(|(key, _)| normalize_name(key) == target)
        .map(|(_, v)| v)
}

fn lookup_param(params: &BTreeMap<String, String>, name: &str) -> Option<String> {
    if let Some(value) = params.get(name) {
        return Some(value.clone());
    }
    let target = normalize_name(name);
    params
        .iter()
        .find(|(key, _)| normalize_name(key) == target)
        .map(|(_, v)| v.clone())
}
