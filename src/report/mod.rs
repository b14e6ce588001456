//! Writes analysis results to disk as JSON and Markdown.

use crate::document::ValidationReport;
use crate::error::ReportError;
use crate::matcher::Dependency;
use crate::operation::OperationShape;
use crate::refine::{IterationSummary, OperationResult, RefinementOutcome, VerificationChange};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

mod markdown;

pub use markdown::ReportFormatter;

pub const DEPENDENCIES_FILE: &str = "dependencies.json";
pub const SUMMARY_FILE: &str = "summary.md";
pub const REFINEMENT_DIFF_FILE: &str = "refinement-diff.md";
pub const ITERATIONS_FILE: &str = "refinement-iterations.md";

/// Everything a report run needs, refined or not.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_path: Option<String>,
    pub operations: Vec<OperationShape>,
    pub dependencies: Vec<Dependency>,
    #[serde(skip)]
    pub validation: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement_changes: Option<Vec<VerificationChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_results: Option<Vec<OperationResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<Vec<IterationSummary>>,
}

impl AnalysisReport {
    pub fn new(operations: Vec<OperationShape>, dependencies: Vec<Dependency>) -> Self {
        Self {
            spec_path: None,
            operations,
            dependencies,
            validation: None,
            refinement_changes: None,
            operation_results: None,
            iterations: None,
        }
    }

    pub fn with_spec_path(mut self, path: impl Into<String>) -> Self {
        self.spec_path = Some(path.into());
        self
    }

    pub fn with_validation(mut self, validation: ValidationReport) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Replaces the candidate dependencies with the refined ones.
    pub fn with_refinement(mut self, outcome: RefinementOutcome) -> Self {
        self.refinement_changes = Some(outcome.changes());
        self.dependencies = outcome.dependencies;
        self.operation_results = Some(outcome.operation_results);
        self.iterations = Some(outcome.iterations);
        self
    }

    pub fn is_refined(&self) -> bool {
        self.iterations.is_some()
    }
}

/// Writes all reports into `dir`, creating it when needed. Returns the written paths.
///
/// `dependencies.json` and `summary.md` are always written; the refinement diff and
/// the iteration trace only for a refined report.
pub fn write_reports(dir: impl AsRef<Path>, report: &AnalysisReport) -> Result<Vec<PathBuf>, ReportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::new();
    let json = serde_json::to_string_pretty(report)?;
    written.push(write_file(dir, DEPENDENCIES_FILE, &json)?);
    written.push(write_file(dir, SUMMARY_FILE, &ReportFormatter::summary(report))?);

    if let (Some(changes), Some(iterations)) = (&report.refinement_changes, &report.iterations) {
        let diff = ReportFormatter::refinement_diff(&report.dependencies, changes);
        written.push(write_file(dir, REFINEMENT_DIFF_FILE, &diff)?);
        let trace = ReportFormatter::iterations(iterations, report.dependencies.len());
        written.push(write_file(dir, ITERATIONS_FILE, &trace)?);
    }

    tracing::debug!(dir = %dir.display(), files = written.len(), "Reports written");
    Ok(written)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, ReportError> {
    let path = dir.join(name);
    fs::write(&path, content).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}
