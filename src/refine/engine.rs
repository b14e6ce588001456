use super::evidence::{Evidence, EvidenceStore, Phase, RequestEvidence, build_response_map};
use super::fill::fill_inputs;
use super::outcome::{IterationSummary, OperationResult, RefinementOutcome};
use super::pool::OutputPool;
use super::verify::verify_dependency;
use crate::config::RefineConfig;
use crate::document::{ApiDocument, JSON_MEDIA_TYPE, RequestInput, extract_example_inputs};
use crate::error::TransportError;
use crate::matcher::{Dependency, Verification};
use crate::operation::OperationShape;
use crate::transport::{HttpRequest, HttpTransport};
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Mutable state of one refinement run. Owned by exactly one run.
#[derive(Debug, Default)]
pub struct RefinementContext {
    pub store: EvidenceStore,
    pub pool: OutputPool,
    results: AHashMap<String, OperationResult>,
}

impl RefinementContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_result(&mut self, id: &str, status: u16, ok: bool) {
        self.results.insert(
            id.to_string(),
            OperationResult {
                id: id.to_string(),
                status,
                ok,
            },
        );
    }
}

/// Executes operations against a live service to verify candidate dependencies.
///
/// Iteration 1 sends the document's example inputs; later iterations fill inputs
/// from the output pool. Calls are strictly sequential in operation order, so a
/// later operation can consume what an earlier one produced in the same iteration.
/// The loop stops at the iteration cap, or after a filled iteration with no
/// successful call and no newly verified dependency.
pub struct RefinementLoop<'a, T: HttpTransport + ?Sized> {
    document: &'a ApiDocument,
    operations: &'a [OperationShape],
    dependencies: &'a [Dependency],
    transport: &'a T,
    config: &'a RefineConfig,
}

impl<'a, T: HttpTransport + ?Sized> RefinementLoop<'a, T> {
    pub fn new(
        document: &'a ApiDocument,
        operations: &'a [OperationShape],
        dependencies: &'a [Dependency],
        transport: &'a T,
        config: &'a RefineConfig,
    ) -> Self {
        Self {
            document,
            operations,
            dependencies,
            transport,
            config,
        }
    }

    pub async fn run(&self) -> RefinementOutcome {
        let mut context = RefinementContext::new();
        let mut iterations = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let phase = if iteration == 1 {
                Phase::Example
            } else {
                Phase::Filled
            };
            let summary = self.run_iteration(&mut context, iteration, phase).await;
            tracing::info!(
                iteration,
                phase = %phase,
                ok = summary.ok_operations,
                total = summary.total_operations,
                new_outputs = summary.new_outputs,
                newly_verified = summary.newly_verified.len(),
                "Refinement iteration finished"
            );

            let stalled = phase == Phase::Filled
                && summary.ok_operations == 0
                && summary.newly_verified.is_empty();
            iterations.push(summary);
            if stalled {
                break;
            }
        }

        let dependencies: Vec<Dependency> = self
            .dependencies
            .iter()
            .map(|dependency| Dependency {
                verification: Some(verify_dependency(dependency, &context.store, self.config)),
                ..dependency.clone()
            })
            .collect();

        let operation_results = self
            .operations
            .iter()
            .filter_map(|op| context.results.get(&op.id).cloned())
            .collect();

        let outcome = RefinementOutcome {
            dependencies,
            iterations,
            operation_results,
        };
        tracing::info!(
            verified = outcome.verified_count(),
            total = outcome.dependencies.len(),
            "Refinement finished"
        );
        outcome
    }

    /// Runs every operation once and reports what changed.
    pub async fn run_iteration(
        &self,
        context: &mut RefinementContext,
        iteration: usize,
        phase: Phase,
    ) -> IterationSummary {
        let verified_before = self.verification_flags(&context.store);
        let pool_before = context.pool.size();
        let mut ok_operations = 0;

        for operation in self.operations {
            let Some(entry) = self.document.find_operation(&operation.path, operation.method) else {
                tracing::warn!(operation = %operation.id, "Missing definition for operation");
                context.set_result(&operation.id, 0, false);
                continue;
            };

            let example = extract_example_inputs(&entry.definition);
            let input = match phase {
                Phase::Example => example,
                Phase::Filled => fill_inputs(operation, &context.pool, &example, self.config),
            };

            let evidence = self.call(operation, input, phase).await;
            if evidence.ok {
                ok_operations += 1;
            }
            context.set_result(&operation.id, evidence.status, evidence.ok);
            context.store.record(&operation.id, evidence);

            if phase == Phase::Filled {
                context.pool = OutputPool::rebuild(&context.store, self.operations);
            }
        }

        context.pool = OutputPool::rebuild(&context.store, self.operations);
        let verified_after = self.verification_flags(&context.store);
        let newly_verified = self
            .dependencies
            .iter()
            .zip(verified_before.iter().zip(&verified_after))
            .filter(|(_, (before, after))| **after && !**before)
            .map(|(dependency, _)| Dependency {
                verification: Some(Verification::Verified),
                ..dependency.clone()
            })
            .collect();

        IterationSummary {
            iteration,
            phase,
            ok_operations,
            total_operations: self.operations.len(),
            new_outputs: context.pool.size().saturating_sub(pool_before),
            newly_verified,
        }
    }

    fn verification_flags(&self, store: &EvidenceStore) -> Vec<bool> {
        self.dependencies
            .iter()
            .map(|dependency| verify_dependency(dependency, store, self.config).is_verified())
            .collect()
    }

    /// Sends one call. Failures become a failed `Evidence` with status 0.
    async fn call(&self, operation: &OperationShape, input: RequestInput, phase: Phase) -> Evidence {
        let mut sent = RequestEvidence {
            body: None,
            path: input.params.path.clone(),
            query: input.params.query.clone(),
            header: lowercase_keys(&input.params.header),
            cookie: input.params.cookie.clone(),
        };

        let request = match build_request(self.config, operation, input) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(operation = %operation.id, phase = %phase, error = %err, "Execution failed");
                return Evidence::failed(sent, phase);
            }
        };
        sent.header = lowercase_keys(&request.headers);
        sent.body = request.body.clone();

        tracing::debug!(
            operation = %operation.id,
            method = %request.method,
            url = %request.url,
            phase = %phase,
            "Calling operation"
        );

        match self.transport.execute(request).await {
            Ok(response) => {
                let ok = response.is_success();
                tracing::debug!(operation = %operation.id, status = response.status, "Operation responded");
                let response_map = if ok {
                    build_response_map(operation, response.body.as_ref())
                } else {
                    Default::default()
                };
                Evidence {
                    request: sent,
                    response: response_map,
                    status: response.status,
                    ok,
                    phase,
                }
            }
            Err(err) => {
                tracing::warn!(operation = %operation.id, phase = %phase, error = %err, "Execution failed");
                Evidence::failed(sent, phase)
            }
        }
    }
}

/// Materializes the live request: substitutes path placeholders, appends query
/// parameters and attaches the body only for methods that permit one.
pub fn build_request(
    config: &RefineConfig,
    operation: &OperationShape,
    input: RequestInput,
) -> Result<HttpRequest, TransportError> {
    let mut path = operation.path.clone();
    for (name, value) in &input.params.path {
        path = path.replace(&format!("{{{}}}", name), value);
    }

    let mut url = config
        .base_url
        .join(&path)
        .map_err(|e| TransportError::InvalidUrl {
            url: path.clone(),
            message: e.to_string(),
        })?;
    if !input.params.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &input.params.query {
            pairs.append_pair(name, value);
        }
    }

    let mut request = HttpRequest::new(operation.method, url);
    request.headers = input.params.header;
    request.cookies = input.params.cookie;

    if operation.method.allows_body() {
        if let Some(body) = input.body {
            let has_content_type = request
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                request
                    .headers
                    .insert("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string());
            }
            request.body = Some(body);
        }
    }
    Ok(request)
}

fn lowercase_keys(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect()
}
