//! # restflow - REST API Dependency Inference Engine
//!
//! **restflow** reads a REST API description (an OpenAPI-style document), proposes which
//! operations feed data into which other operations, and then verifies those guesses
//! empirically by calling the live service.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse a JSON or YAML description with `load_document` (or build an
//!     `ApiDocument` from memory). Document order of paths and methods is preserved.
//! 2.  **Validate**: `validate_document` rejects documents that cannot be analysed (no
//!     version marker, no operations, no operation with a 2xx response).
//! 3.  **Model**: The `OperationModelBuilder` resolves `$ref`/`allOf`/`oneOf`/`anyOf`
//!     schemas and flattens every operation into dotted field descriptors.
//! 4.  **Match**: The `DependencyMatcher` proposes confidence-scored candidate edges with
//!     four heuristics: exact-name, token-match, entity-id and auth.
//! 5.  **Refine**: The `RefinementLoop` replays the operations against a live service,
//!     first with the document's examples and then with values harvested from earlier
//!     responses, and marks every candidate `verified` or `unverified`.
//!
//! Steps 1 to 4 are wrapped by `Pipeline`; step 5 by `Analysis::refine`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restflow::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load, validate, model and match in one call.
//!     let analysis = Pipeline::from_path("openapi.yaml")?;
//!     println!(
//!         "{} operations, {} candidate dependencies",
//!         analysis.operations().len(),
//!         analysis.dependencies().len()
//!     );
//!
//!     // Verify the candidates against a running service.
//!     let config = RefineConfig::builder("http://localhost:3000")
//!         .with_max_iterations(5)
//!         .build()?;
//!     let outcome = analysis.refine(&ReqwestTransport::new(), &config).await;
//!
//!     for dependency in outcome.dependencies.iter().filter(|d| d.is_verified()) {
//!         println!("{}", dependency);
//!     }
//!
//!     // Persist JSON and Markdown reports.
//!     let report = analysis.report().with_refinement(outcome);
//!     write_reports("output/shop", &report)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Custom heuristics
//!
//! Additional strategies implement `MatchRule` and are registered on the matcher builder:
//!
//! ```rust,no_run
//! use restflow::prelude::*;
//!
//! struct SameFieldName;
//!
//! impl MatchRule for SameFieldName {
//!     fn reason(&self) -> MatchReason {
//!         MatchReason::ExactName
//!     }
//!
//!     fn propose(&self, source: &OperationShape, input: &FieldDescriptor) -> Vec<FieldMatch> {
//!         source
//!             .response_field(&input.name)
//!             .map(|field| FieldMatch { source_field: field.name.clone(), confidence: 0.5 })
//!             .into_iter()
//!             .collect()
//!     }
//! }
//!
//! let matcher = DependencyMatcher::builder().with_rule(Box::new(SameFieldName)).build();
//! let pipeline = Pipeline::with_matcher(matcher);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod matcher;
pub mod operation;
pub mod pipeline;
pub mod prelude;
pub mod refine;
pub mod report;
pub mod schema;
pub mod transport;
