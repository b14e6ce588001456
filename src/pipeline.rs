use crate::config::RefineConfig;
use crate::document::{ApiDocument, ValidationReport, load_document, validate_document};
use crate::error::{PipelineError, ValidationFailure};
use crate::matcher::{Dependency, DependencyMatcher};
use crate::operation::{OperationShape, build_operations};
use crate::refine::{RefinementLoop, RefinementOutcome};
use crate::report::AnalysisReport;
use crate::transport::HttpTransport;
use std::path::Path;

/// Load, validate, build the operation model and propose candidate dependencies.
pub struct Pipeline {
    matcher: DependencyMatcher,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            matcher: DependencyMatcher::default(),
        }
    }

    pub fn with_matcher(matcher: DependencyMatcher) -> Self {
        Self { matcher }
    }

    /// Runs the default pipeline over a document file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Analysis, PipelineError> {
        Self::new().analyze(load_document(path)?)
    }

    /// Runs the default pipeline over an in-memory document.
    pub fn from_document(document: ApiDocument) -> Result<Analysis, PipelineError> {
        Self::new().analyze(document)
    }

    /// Fails before any network activity when the document is structurally unusable.
    pub fn analyze(&self, document: ApiDocument) -> Result<Analysis, PipelineError> {
        let validation = validate_document(&document);
        for warning in &validation.warnings {
            tracing::warn!(warning = %warning, "Validation warning");
        }
        if !validation.is_valid() {
            return Err(ValidationFailure {
                errors: validation.errors.clone(),
            }
            .into());
        }

        let operations = build_operations(&document);
        let dependencies = self.matcher.infer(&operations);
        tracing::info!(
            operations = operations.len(),
            dependencies = dependencies.len(),
            "Candidate dependencies extracted"
        );

        Ok(Analysis {
            document,
            validation,
            operations,
            dependencies,
        })
    }
}

/// A validated document with its operation model and candidate dependencies.
#[derive(Debug, Clone)]
pub struct Analysis {
    document: ApiDocument,
    validation: ValidationReport,
    operations: Vec<OperationShape>,
    dependencies: Vec<Dependency>,
}

impl Analysis {
    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    pub fn validation(&self) -> &ValidationReport {
        &self.validation
    }

    pub fn operations(&self) -> &[OperationShape] {
        &self.operations
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Verifies the candidate dependencies against a live service.
    pub async fn refine<T: HttpTransport + ?Sized>(
        &self,
        transport: &T,
        config: &RefineConfig,
    ) -> RefinementOutcome {
        tracing::info!(
            dependencies = self.dependencies.len(),
            base_url = %config.base_url,
            "Refining dependencies"
        );
        RefinementLoop::new(
            &self.document,
            &self.operations,
            &self.dependencies,
            transport,
            config,
        )
        .run()
        .await
    }

    /// The unrefined report.
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::new(self.operations.clone(), self.dependencies.clone())
            .with_validation(self.validation.clone())
    }
}
