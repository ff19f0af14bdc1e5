//! Safety Gate
//!
//! The final validation pass before compilation. One generation round-trip
//! reviews the merged diagnoses against the case's allergies and
//! medications; the parsed checks are returned together with the
//! deterministic allergy cross-reference. The cross-reference is computed
//! first, so it survives a failed round-trip.
//!
//! The gate only ever adds checks. `append_checks` is the single place the
//! merged result is touched, and it never removes or rewrites an entry.

use std::sync::Arc;

use iatrikos_core::{parse_safety_checks, AnalysisResult, Case, SafetyCheck};
use iatrikos_llm::GenerationProvider;

use crate::heuristic::allergy_conflicts;
use crate::prompt::build_safety_prompt;

pub struct SafetyGate {
    provider: Arc<dyn GenerationProvider>,
}

impl SafetyGate {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Review a merged analysis. An unreadable response or a failed
    /// round-trip yields no generated checks; heuristic checks are always
    /// returned.
    pub async fn validate(&self, merged: &AnalysisResult, case: &Case) -> Vec<SafetyCheck> {
        let conflicts = allergy_conflicts(merged, case);

        let prompt = build_safety_prompt(merged, case);
        let mut checks = match self.provider.generate(&prompt).await {
            Ok(response) => parse_safety_checks(&response),
            Err(e) => {
                tracing::warn!(
                    case_id = %case.case_id,
                    error = %e,
                    "safety review failed, keeping heuristic checks only"
                );
                Vec::new()
            }
        };
        if checks.is_empty() {
            tracing::debug!(case_id = %case.case_id, "safety review returned no readable checks");
        }
        checks.extend(conflicts);
        checks
    }
}

/// Append gate checks after every producer check.
pub fn append_checks(merged: &mut AnalysisResult, checks: Vec<SafetyCheck>) -> usize {
    let appended = checks.len();
    merged.safety_checks.extend(checks);
    appended
}
