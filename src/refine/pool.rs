use super::evidence::{Evidence, EvidenceStore};
use crate::matcher::names::{is_token_like, normalize_name};
use crate::operation::OperationShape;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Every response value observed so far, indexed by field name and by owning entity.
///
/// Snapshots are absorbed in the order their calls were recorded, so the last entry
/// of a list is the most recent value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputPool {
    values: BTreeMap<String, Vec<Value>>,
    /// entity (normalized) -> field name -> values
    entities: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl OutputPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the best successful snapshot of every operation, oldest call first.
    pub fn rebuild(store: &EvidenceStore, operations: &[OperationShape]) -> Self {
        let snapshots = operations
            .iter()
            .filter_map(|op| {
                store
                    .best_successful_sequenced(&op.id)
                    .map(|(sequence, evidence)| (sequence, op, evidence))
            })
            .sorted_by_key(|(sequence, _, _)| *sequence);

        let mut pool = Self::new();
        for (_, operation, evidence) in snapshots {
            pool.absorb(operation, evidence);
        }
        pool
    }

    fn absorb(&mut self, operation: &OperationShape, evidence: &Evidence) {
        for (key, value) in &evidence.response {
            self.push(key, value.clone());

            if let Some(Value::Object(first)) = value.as_array().and_then(|items| items.first()) {
                for (nested_key, nested_value) in first {
                    self.push(nested_key, nested_value.clone());
                }
            }

            let entity = operation
                .response_field(key)
                .and_then(|field| field.entity.as_deref())
                .map(normalize_name)
                .filter(|entity| !entity.is_empty());
            if let Some(entity) = entity {
                self.entities
                    .entry(entity)
                    .or_default()
                    .entry(key.clone())
                    .or_default()
                    .push(value.clone());
            }
        }
    }

    fn push(&mut self, key: &str, value: Value) {
        self.values.entry(key.to_string()).or_default().push(value);
    }

    /// Total number of pooled values across all keys.
    pub fn size(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self, key: &str) -> &[Value] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn latest(&self, key: &str) -> Option<&Value> {
        self.values.get(key)?.last()
    }

    /// Most recent value under `key` or any key normalizing to the same text.
    pub fn latest_normalized(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.latest(key) {
            return Some(value);
        }
        let target = normalize_name(key);
        self.find_latest(|candidate| candidate == target)
    }

    pub fn latest_entity(&self, entity: &str, key: &str) -> Option<&Value> {
        self.entities
            .get(&normalize_name(entity))?
            .get(key)?
            .last()
    }

    /// Any pooled `id`, else the first key whose normalized form ends in `id`.
    pub fn latest_id_like(&self) -> Option<&Value> {
        self.latest("id")
            .or_else(|| self.find_latest(|candidate| candidate.ends_with("id")))
    }

    pub fn latest_token(&self) -> Option<&Value> {
        self.values
            .iter()
            .filter(|(key, _)| is_token_like(key))
            .find_map(|(_, values)| values.last())
    }

    fn find_latest(&self, predicate: impl Fn(&str) -> bool) -> Option<&Value> {
        self.values
            .iter()
            .filter(|(key, _)| predicate(&normalize_name(key)))
            .find_map(|(_, values)| values.last())
    }
}
