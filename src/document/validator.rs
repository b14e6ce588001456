use super::definition::{ApiDocument, OperationDefinition, OperationEntry, ParameterDefinition, pick_media_type};
use super::examples::has_example_entries;
use serde::Serialize;
use serde_json::Value;

/// Counters collected while validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_operations: usize,
    pub operations_with_2xx: usize,
    pub operations_with_response_schema: usize,
    pub operations_with_request_schema: usize,
    pub operations_with_request_examples: usize,
    pub total_params: usize,
    pub params_with_examples: usize,
    pub params_missing_schema: usize,
    pub auth_operations: usize,
}

/// Outcome of structural validation. Any entry in `errors` aborts analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks that a document carries enough information for dependency analysis.
pub fn validate_document(document: &ApiDocument) -> ValidationReport {
    let mut report = ValidationReport::default();

    if document.version().is_none() {
        report.errors.push("Missing openapi field.".to_string());
        return report;
    }
    if document.path_count() == 0 {
        report
            .errors
            .push("No paths found in the API description.".to_string());
        return report;
    }

    for entry in document.operations() {
        check_operation(document, entry, &mut report);
    }

    let stats = &report.stats;
    if stats.total_operations == 0 {
        report
            .errors
            .push("No operations found in the API description paths.".to_string());
    } else if stats.operations_with_2xx == 0 {
        report.errors.push(
            "No operations expose a 2xx response; dependency extraction cannot proceed."
                .to_string(),
        );
    }
    if report.stats.params_missing_schema > 0 {
        let missing = report.stats.params_missing_schema;
        report
            .warnings
            .push(format!("Found {} parameters without schema/type.", missing));
    }

    report
}

fn check_operation(document: &ApiDocument, entry: &OperationEntry, report: &mut ValidationReport) {
    let op = &entry.definition;
    let id = entry.id();
    report.stats.total_operations += 1;

    match op.success_response() {
        Some(_) => {
            report.stats.operations_with_2xx += 1;
            if op.success_schema().is_some() {
                report.stats.operations_with_response_schema += 1;
            } else {
                report
                    .warnings
                    .push(format!("Operation {} has a 2xx response without a schema.", id));
            }
        }
        None => report
            .warnings
            .push(format!("Operation {} has no 2xx response.", id)),
    }

    if op.request_body.is_some() {
        if op.request_schema().is_some() {
            report.stats.operations_with_request_schema += 1;
        } else {
            report
                .errors
                .push(format!("Operation {} has a request body without a schema.", id));
        }
        if has_request_example(op) {
            report.stats.operations_with_request_examples += 1;
        } else {
            report
                .errors
                .push(format!("Operation {} has a request body without an example.", id));
        }
    }

    report.stats.total_params += op.parameters.len();
    for param in &op.parameters {
        if param_schema_type(param).is_none() {
            report.stats.params_missing_schema += 1;
        }
        if has_param_example(param) {
            report.stats.params_with_examples += 1;
        } else {
            report.errors.push(format!(
                "Operation {} parameter '{}' has no example.",
                id, param.name
            ));
        }
    }

    if op.has_security() {
        report.stats.auth_operations += 1;
        for requirement in op.security.iter().flatten() {
            for scheme in requirement.keys() {
                if document.security_scheme(scheme).is_none() {
                    report.warnings.push(format!(
                        "Operation {} references missing security scheme '{}'.",
                        id, scheme
                    ));
                }
            }
        }
    }
}

fn has_examples(node: &Value) -> bool {
    node.get("example").is_some() || node.get("examples").is_some_and(has_example_entries)
}

fn has_request_example(op: &OperationDefinition) -> bool {
    let Some(content) = op.request_body.as_ref().and_then(|b| b.content.as_ref()) else {
        return false;
    };
    let Some(media) = pick_media_type(content) else {
        return false;
    };
    has_examples(media) || media.get("schema").is_some_and(has_examples)
}

fn has_param_example(param: &ParameterDefinition) -> bool {
    param.example.is_some()
        || param.examples.as_ref().is_some_and(has_example_entries)
        || param.schema.as_ref().is_some_and(has_examples)
}

fn param_schema_type(param: &ParameterDefinition) -> Option<&str> {
    param.schema.as_ref()?.get("type")?.as_str()
}
