use crate::operation::OperationShape;
use crate::schema::{ARRAY_FIELD, SCALAR_FIELD};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// How the inputs of a call were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Literal examples from the document.
    Example,
    /// Values taken from the output pool.
    Filled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Example => write!(f, "example"),
            Phase::Filled => write!(f, "filled"),
        }
    }
}

/// The inputs that were actually sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestEvidence {
    /// Present only when a body went out on the wire.
    pub body: Option<Value>,
    pub path: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    /// Keys are lowercased.
    pub header: BTreeMap<String, String>,
    pub cookie: BTreeMap<String, String>,
}

/// One recorded call of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub request: RequestEvidence,
    /// Observed values keyed by response field name; empty unless the call succeeded.
    pub response: Map<String, Value>,
    /// HTTP status, `0` when the call never completed.
    pub status: u16,
    pub ok: bool,
    pub phase: Phase,
}

impl Evidence {
    /// A call that failed before any response arrived.
    pub fn failed(request: RequestEvidence, phase: Phase) -> Self {
        Self {
            request,
            response: Map::new(),
            status: 0,
            ok: false,
            phase,
        }
    }
}

/// A stored snapshot and its position in the order calls were recorded.
#[derive(Debug, Clone)]
struct Recorded {
    sequence: u64,
    evidence: Evidence,
}

#[derive(Debug, Clone, Default)]
struct EvidenceSlot {
    example: Option<Recorded>,
    filled: Option<Recorded>,
}

/// Latest evidence per operation and phase. A newer record replaces the older one
/// of the same phase.
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    slots: AHashMap<String, EvidenceSlot>,
    recorded: u64,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, operation_id: &str, evidence: Evidence) {
        self.recorded += 1;
        let recorded = Recorded {
            sequence: self.recorded,
            evidence,
        };
        let slot = self.slots.entry(operation_id.to_string()).or_default();
        match recorded.evidence.phase {
            Phase::Example => slot.example = Some(recorded),
            Phase::Filled => slot.filled = Some(recorded),
        }
    }

    pub fn get(&self, operation_id: &str, phase: Phase) -> Option<&Evidence> {
        let slot = self.slots.get(operation_id)?;
        let recorded = match phase {
            Phase::Example => slot.example.as_ref(),
            Phase::Filled => slot.filled.as_ref(),
        };
        recorded.map(|r| &r.evidence)
    }

    /// Successful `filled`, then successful `example`, then whatever was recorded last.
    pub fn best(&self, operation_id: &str) -> Option<&Evidence> {
        self.best_recorded(operation_id).map(|r| &r.evidence)
    }

    pub fn best_successful(&self, operation_id: &str) -> Option<&Evidence> {
        self.best(operation_id).filter(|e| e.ok)
    }

    /// The best successful snapshot with its recording sequence number (1-based).
    pub fn best_successful_sequenced(&self, operation_id: &str) -> Option<(u64, &Evidence)> {
        self.best_recorded(operation_id)
            .filter(|r| r.evidence.ok)
            .map(|r| (r.sequence, &r.evidence))
    }

    fn best_recorded(&self, operation_id: &str) -> Option<&Recorded> {
        let slot = self.slots.get(operation_id)?;
        let filled = slot.filled.as_ref();
        let example = slot.example.as_ref();
        filled
            .filter(|r| r.evidence.ok)
            .or(example.filter(|r| r.evidence.ok))
            .or(filled)
            .or(example)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Looks up a flattened field name inside a JSON value.
///
/// `[]` selects the value itself when it is an array, `value` selects a bare
/// scalar body, anything else walks dotted object keys.
pub fn value_at_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path == ARRAY_FIELD {
        return value.is_array().then_some(value);
    }
    if path.is_empty() {
        return None;
    }
    if path == SCALAR_FIELD && !value.is_object() && !value.is_array() {
        return (!value.is_null()).then_some(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Extracts the values of the operation's response fields from a response body.
pub fn build_response_map(operation: &OperationShape, body: Option<&Value>) -> Map<String, Value> {
    let mut values = Map::new();
    let Some(body) = body else {
        return values;
    };
    for field in &operation.response_fields {
        if let Some(value) = value_at_path(body, &field.name) {
            values.insert(field.name.clone(), value.clone());
        }
    }
    values
}
