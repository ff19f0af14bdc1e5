//! Iatrikos Safety
//!
//! The final safety gate run over a merged analysis before it is compiled:
//!
//! - `gate` - `SafetyGate` (generated safety review) and `append_checks`
//! - `heuristic` - deterministic allergy cross-reference
//! - `prompt` - safety review prompt construction

pub mod gate;
pub mod heuristic;
pub mod prompt;

pub use gate::{append_checks, SafetyGate};
pub use heuristic::{allergy_conflicts, ALLERGY_CONFLICT};
pub use prompt::build_safety_prompt;
