use crate::document::ParamLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the consumer receives the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Body,
    Path,
    Query,
    Header,
    Cookie,
    Auth,
}

impl From<ParamLocation> for DependencyKind {
    fn from(location: ParamLocation) -> Self {
        match location {
            ParamLocation::Path => Self::Path,
            ParamLocation::Query => Self::Query,
            ParamLocation::Header => Self::Header,
            ParamLocation::Cookie => Self::Cookie,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Body => "body",
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Auth => "auth",
        };
        f.write_str(s)
    }
}

/// Which heuristic proposed an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
    ExactName,
    TokenMatch,
    EntityId,
    Auth,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ExactName => "exact-name",
            Self::TokenMatch => "token-match",
            Self::EntityId => "entity-id",
            Self::Auth => "auth",
        };
        f.write_str(s)
    }
}

/// Empirical status assigned by the refinement loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verification {
    Verified,
    Unverified,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_verified() { "verified" } else { "unverified" })
    }
}

/// A candidate data-flow edge: a response value of `from_operation` feeds
/// `field` of `to_operation`.
///
/// The matcher never deduplicates, so several edges may share the same pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub from_operation: String,
    pub to_operation: String,
    /// Consumer-side input name.
    pub field: String,
    /// Provider-side response field the value is read from.
    pub source_field: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub kind: DependencyKind,
    pub reason: MatchReason,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

impl Dependency {
    pub fn is_verified(&self) -> bool {
        self.verification.is_some_and(|v| v.is_verified())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}] {}:{} ({}, {:.2}",
            self.from_operation,
            self.to_operation,
            self.kind,
            self.field,
            self.field_type,
            self.reason,
            self.confidence
        )?;
        if let Some(status) = self.verification {
            write!(f, ", {}", status)?;
        }
        f.write_str(")")
    }
}
