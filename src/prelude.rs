//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the restflow crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use restflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let analysis = Pipeline::from_path("path/to/openapi.json")?;
//! let report = analysis.report();
//! write_reports("output", &report)?;
//! # Ok(())
//! # }
//! ```

// Document model
pub use crate::document::{
    ApiDocument, HttpMethod, ParamLocation, RequestInput, ValidationReport, extract_example_inputs,
    load_document, validate_document,
};

// Schema and operation model
pub use crate::operation::{OperationModelBuilder, OperationShape, build_operations};
pub use crate::schema::{FieldDescriptor, ParamDescriptor, SchemaResolver};

// Dependency matching
pub use crate::matcher::{
    Dependency, DependencyKind, DependencyMatcher, FieldMatch, MatchReason, MatchRule,
    Verification, extract_dependencies,
};

// Refinement
pub use crate::config::RefineConfig;
pub use crate::refine::{IterationSummary, OperationResult, RefinementLoop, RefinementOutcome};
pub use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

// Orchestration and reports
pub use crate::pipeline::{Analysis, Pipeline};
pub use crate::report::{AnalysisReport, ReportFormatter, write_reports};

// Error types
pub use crate::error::{
    DocumentError, PipelineError, RefineError, ReportError, TransportError, ValidationFailure,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
