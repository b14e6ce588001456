mod engine;
pub mod evidence;
pub mod fill;
mod outcome;
pub mod pool;
pub mod verify;

pub use engine::{RefinementContext, RefinementLoop, build_request};
pub use evidence::{Evidence, EvidenceStore, Phase, RequestEvidence};
pub use fill::fill_inputs;
pub use outcome::*;
pub use pool::OutputPool;
pub use verify::verify_dependency;
