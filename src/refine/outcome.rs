use super::evidence::Phase;
use crate::matcher::{Dependency, Verification};
use serde::Serialize;

/// What one iteration of the refinement loop achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationSummary {
    /// 1-based; iteration 1 is always the example phase.
    pub iteration: usize,
    pub phase: Phase,
    pub ok_operations: usize,
    pub total_operations: usize,
    /// Growth of the output pool over the iteration.
    pub new_outputs: usize,
    /// Dependencies verified now that were not verified before the iteration.
    pub newly_verified: Vec<Dependency>,
}

/// The last observed result of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub id: String,
    pub status: u16,
    pub ok: bool,
}

/// Verification status of one dependency before and after refinement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationChange {
    pub dependency: Dependency,
    pub before: Verification,
    pub after: Verification,
}

impl VerificationChange {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementOutcome {
    /// Every candidate dependency, in matcher order, annotated with its final status.
    pub dependencies: Vec<Dependency>,
    pub iterations: Vec<IterationSummary>,
    /// In operation order.
    pub operation_results: Vec<OperationResult>,
}

impl RefinementOutcome {
    pub fn verified_count(&self) -> usize {
        self.dependencies.iter().filter(|d| d.is_verified()).count()
    }

    /// Status changes relative to the matcher output, where everything starts unverified.
    pub fn changes(&self) -> Vec<VerificationChange> {
        self.dependencies
            .iter()
            .map(|dependency| VerificationChange {
                dependency: dependency.clone(),
                before: Verification::Unverified,
                after: dependency.verification.unwrap_or(Verification::Unverified),
            })
            .collect()
    }
}
