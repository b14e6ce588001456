use super::dependency::MatchReason;
use super::names::{normalize_name, refers_to_entity, tokenize_name, types_compatible};
use crate::operation::OperationShape;
use crate::schema::FieldDescriptor;

pub const EXACT_NAME_CONFIDENCE: f64 = 0.9;
pub const EXACT_NAME_FORMAT_CONFIDENCE: f64 = 0.95;
pub const TOKEN_MATCH_CONFIDENCE: f64 = 0.7;
pub const ENTITY_ID_CONFIDENCE: f64 = 0.8;
pub const AUTH_CONFIDENCE: f64 = 0.85;

/// A provider field proposed for one consumer input.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub source_field: String,
    pub confidence: f64,
}

/// Defines one field-level heuristic: which response fields of `source` could feed `input`.
pub trait MatchRule: Send + Sync {
    fn reason(&self) -> MatchReason;
    fn propose(&self, source: &OperationShape, input: &FieldDescriptor) -> Vec<FieldMatch>;
}

/// Normalized names equal and types compatible.
pub struct ExactNameRule;

impl MatchRule for ExactNameRule {
    fn reason(&self) -> MatchReason {
        MatchReason::ExactName
    }

    fn propose(&self, source: &OperationShape, input: &FieldDescriptor) -> Vec<FieldMatch> {
        let key = normalize_name(&input.name);
        if key.is_empty() {
            return Vec::new();
        }
        source
            .response_fields
            .iter()
            .filter(|field| normalize_name(&field.name) == key && types_compatible(field, input))
            .map(|field| FieldMatch {
                source_field: field.name.clone(),
                confidence: if field.format.is_some() && input.format.is_some() {
                    EXACT_NAME_FORMAT_CONFIDENCE
                } else {
                    EXACT_NAME_CONFIDENCE
                },
            })
            .collect()
    }
}

/// Same word tokens under different spellings, e.g. `orderIds` and `order_id`.
pub struct TokenMatchRule;

impl MatchRule for TokenMatchRule {
    fn reason(&self) -> MatchReason {
        MatchReason::TokenMatch
    }

    fn propose(&self, source: &OperationShape, input: &FieldDescriptor) -> Vec<FieldMatch> {
        let tokens = tokenize_name(&input.name);
        if tokens.is_empty() {
            return Vec::new();
        }
        let key = normalize_name(&input.name);
        source
            .response_fields
            .iter()
            .filter(|field| {
                normalize_name(&field.name) != key
                    && tokenize_name(&field.name) == tokens
                    && types_compatible(field, input)
            })
            .map(|field| FieldMatch {
                source_field: field.name.clone(),
                confidence: TOKEN_MATCH_CONFIDENCE,
            })
            .collect()
    }
}

/// `<entity>Id` inputs fed by a response `id` tagged with that entity.
pub struct EntityIdRule;

impl MatchRule for EntityIdRule {
    fn reason(&self) -> MatchReason {
        MatchReason::EntityId
    }

    fn propose(&self, source: &OperationShape, input: &FieldDescriptor) -> Vec<FieldMatch> {
        source
            .response_fields
            .iter()
            .find(|field| {
                field.name == "id"
                    && field
                        .entity
                        .as_deref()
                        .is_some_and(|entity| refers_to_entity(&input.name, entity))
                    && types_compatible(field, input)
            })
            .map(|field| FieldMatch {
                source_field: field.name.clone(),
                confidence: ENTITY_ID_CONFIDENCE,
            })
            .into_iter()
            .collect()
    }
}

pub(super) fn default_rules() -> Vec<Box<dyn MatchRule>> {
    vec![
        Box::new(ExactNameRule),
        Box::new(TokenMatchRule),
        Box::new(EntityIdRule),
    ]
}
