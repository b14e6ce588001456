use crate::operation::OperationShape;
use crate::schema::FieldDescriptor;

mod dependency;
pub mod names;
pub mod rules;

pub use dependency::*;
pub use rules::{EntityIdRule, ExactNameRule, FieldMatch, MatchRule, TokenMatchRule};

use names::is_token_like;
use rules::{AUTH_CONFIDENCE, default_rules};

/// Conventional header carrying a bearer credential.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Proposes confidence-scored candidate dependencies between operations.
///
/// Every ordered pair of distinct operations is checked with each registered rule
/// against the target's body fields, path parameters and other parameters, then
/// token providers are linked to every operation that requires bearer auth. The
/// result is a list, not a set: overlapping edges are kept.
pub struct DependencyMatcher {
    rules: Vec<Box<dyn MatchRule>>,
    auth_header: String,
}

pub struct MatcherBuilder {
    rules: Vec<Box<dyn MatchRule>>,
    auth_header: String,
}

impl MatcherBuilder {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }

    /// Appends a rule after the built-in ones.
    pub fn with_rule(mut self, rule: Box<dyn MatchRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn without_default_rules(mut self) -> Self {
        self.rules.clear();
        self
    }

    pub fn with_auth_header(mut self, header: &str) -> Self {
        self.auth_header = header.to_string();
        self
    }

    pub fn build(self) -> DependencyMatcher {
        DependencyMatcher {
            rules: self.rules,
            auth_header: self.auth_header,
        }
    }
}

impl Default for MatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for DependencyMatcher {
    fn default() -> Self {
        MatcherBuilder::new().build()
    }
}

impl DependencyMatcher {
    pub fn builder() -> MatcherBuilder {
        MatcherBuilder::new()
    }

    pub fn infer(&self, operations: &[OperationShape]) -> Vec<Dependency> {
        let mut dependencies = Vec::new();
        for source in operations {
            for target in operations {
                if source.id == target.id {
                    continue;
                }
                self.match_pair(source, target, &mut dependencies);
            }
        }
        self.match_auth(operations, &mut dependencies);
        dependencies
    }

    fn match_pair(&self, source: &OperationShape, target: &OperationShape, out: &mut Vec<Dependency>) {
        if source.response_fields.is_empty() {
            return;
        }

        let body = target
            .request_fields
            .iter()
            .map(|field| (field, DependencyKind::Body));
        let params = target
            .params()
            .map(|param| (&param.field, DependencyKind::from(param.location)));

        for (input, kind) in body.chain(params) {
            for rule in &self.rules {
                for found in rule.propose(source, input) {
                    out.push(edge(source, target, input, kind, rule.reason(), found));
                }
            }
        }
    }

    fn match_auth(&self, operations: &[OperationShape], out: &mut Vec<Dependency>) {
        let providers = operations.iter().filter_map(|op| {
            op.response_fields
                .iter()
                .find(|field| is_token_like(&field.name))
                .map(|field| (op, field))
        });

        for (provider, token_field) in providers {
            for consumer in operations.iter().filter(|op| op.requires_auth) {
                if provider.id == consumer.id {
                    continue;
                }
                out.push(Dependency {
                    from_operation: provider.id.clone(),
                    to_operation: consumer.id.clone(),
                    field: self.auth_header.clone(),
                    source_field: token_field.name.clone(),
                    field_type: "string".to_string(),
                    kind: DependencyKind::Auth,
                    reason: MatchReason::Auth,
                    confidence: AUTH_CONFIDENCE,
                    verification: None,
                });
            }
        }
    }
}

fn edge(
    source: &OperationShape,
    target: &OperationShape,
    input: &FieldDescriptor,
    kind: DependencyKind,
    reason: MatchReason,
    found: FieldMatch,
) -> Dependency {
    Dependency {
        from_operation: source.id.clone(),
        to_operation: target.id.clone(),
        field: input.name.clone(),
        source_field: found.source_field,
        field_type: input.field_type.clone(),
        kind,
        reason,
        confidence: found.confidence,
        verification: None,
    }
}

/// Runs the default matcher over `operations`.
pub fn extract_dependencies(operations: &[OperationShape]) -> Vec<Dependency> {
    DependencyMatcher::default().infer(operations)
}
