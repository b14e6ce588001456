use super::AnalysisReport;
use crate::matcher::Dependency;
use crate::refine::{IterationSummary, VerificationChange};
use itertools::Itertools;

/// Renders analysis results as Markdown documents.
pub struct ReportFormatter;

impl ReportFormatter {
    /// One bullet line: `- FROM -> TO [kind] field:type (reason, 0.95, verified)`.
    pub fn dependency_line(dependency: &Dependency) -> String {
        format!("- {}", dependency)
    }

    pub fn summary(report: &AnalysisReport) -> String {
        let mut lines = vec!["# API Dependency Summary".to_string(), String::new()];

        if let Some(path) = &report.spec_path {
            lines.push(format!("Source: `{}`", path));
            lines.push(String::new());
        }

        lines.push("## Operations".to_string());
        lines.push(String::new());
        for op in &report.operations {
            lines.push(format!("- {} ({} {})", op.id, op.method, op.path));
        }
        lines.push(String::new());

        lines.push("## Dependencies".to_string());
        lines.push(String::new());
        if report.dependencies.is_empty() {
            lines.push("No dependencies found.".to_string());
        } else {
            lines.extend(report.dependencies.iter().map(Self::dependency_line));
            lines.push(String::new());
            let by_reason = report
                .dependencies
                .iter()
                .counts_by(|d| d.reason.to_string())
                .into_iter()
                .sorted()
                .map(|(reason, count)| format!("{}: {}", reason, count))
                .join(", ");
            lines.push(format!("By reason: {}", by_reason));
        }
        lines.push(String::new());

        if let Some(validation) = &report.validation {
            let stats = &validation.stats;
            lines.push("## Validation".to_string());
            lines.push(String::new());
            lines.push(format!(
                "- operations: {} ({} with 2xx, {} with response schema, {} with request schema)",
                stats.total_operations,
                stats.operations_with_2xx,
                stats.operations_with_response_schema,
                stats.operations_with_request_schema,
            ));
            lines.push(format!(
                "- parameters: {} ({} with examples, {} missing schema)",
                stats.total_params, stats.params_with_examples, stats.params_missing_schema,
            ));
            lines.push(format!("- authenticated operations: {}", stats.auth_operations));
            for warning in &validation.warnings {
                lines.push(format!("- warning: {}", warning));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    pub fn refinement_diff(dependencies: &[Dependency], changes: &[VerificationChange]) -> String {
        let verified = dependencies.iter().filter(|d| d.is_verified()).count();
        let changed: Vec<&VerificationChange> = changes.iter().filter(|c| c.changed()).collect();

        let mut lines = vec![
            "# Refinement Diff".to_string(),
            String::new(),
            format!("Total dependencies: {}", dependencies.len()),
            format!("Verified after refinement: {}", verified),
            format!("Changed after refinement: {}", changed.len()),
            String::new(),
            "## Changes".to_string(),
            String::new(),
        ];
        if changed.is_empty() {
            lines.push("No dependencies changed after refinement.".to_string());
        } else {
            for change in changed {
                lines.push(format!("- {} -> {}: {}", change.before, change.after, change.dependency));
            }
        }
        lines.push(String::new());

        let (verified_deps, unverified_deps): (Vec<&Dependency>, Vec<&Dependency>) =
            dependencies.iter().partition(|d| d.is_verified());

        lines.push("## Verified Dependencies".to_string());
        lines.push(String::new());
        lines.extend(verified_deps.into_iter().map(Self::dependency_line));
        lines.push(String::new());

        lines.push("## Unverified Dependencies".to_string());
        lines.push(String::new());
        if unverified_deps.is_empty() {
            lines.push("All dependencies verified.".to_string());
        } else {
            lines.extend(unverified_deps.into_iter().map(Self::dependency_line));
        }
        lines.push(String::new());

        lines.join("\n")
    }

    pub fn iterations(iterations: &[IterationSummary], total_dependencies: usize) -> String {
        let mut lines = vec![
            "# Refinement Iterations".to_string(),
            String::new(),
            format!("Total dependencies: {}", total_dependencies),
            String::new(),
        ];

        for iteration in iterations {
            lines.push(format!("## Iteration {} ({})", iteration.iteration, iteration.phase));
            lines.push(String::new());
            lines.push(format!(
                "- operations ok: {}/{}",
                iteration.ok_operations, iteration.total_operations
            ));
            lines.push(format!("- new outputs: {}", iteration.new_outputs));
            lines.push(format!(
                "- newly verified dependencies: {}",
                iteration.newly_verified.len()
            ));
            lines.push(String::new());
            if iteration.newly_verified.is_empty() {
                lines.push("No new dependencies verified in this iteration.".to_string());
            } else {
                lines.extend(iteration.newly_verified.iter().map(Self::dependency_line));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
