//! Merge Engine
//!
//! Combines producer results into one de-duplicated `AnalysisResult`.
//!
//! - Diagnoses are keyed by exact name: highest confidence wins, evidence
//!   is unioned. Output is ordered by name.
//! - Safety checks are concatenated in input order and never deduplicated.
//! - Evidence is a key-wise union.
//! - Plan, recommendations, findings and risk factors are set unions.
//!
//! `raw_response` plays no part in merging beyond keeping the first one seen.

use std::collections::BTreeMap;

use iatrikos_core::{AnalysisResult, Diagnosis};

/// Merge any number of producer results.
pub fn merge(results: &[AnalysisResult]) -> AnalysisResult {
    let mut diagnoses: BTreeMap<&str, Diagnosis> = BTreeMap::new();
    let mut merged = AnalysisResult::empty();

    for result in results {
        for diagnosis in &result.diagnoses {
            match diagnoses.get_mut(diagnosis.name.as_str()) {
                Some(existing) => {
                    existing.confidence = existing.confidence.max(diagnosis.confidence);
                    existing.evidence.extend(diagnosis.evidence.iter().cloned());
                }
                None => {
                    diagnoses.insert(diagnosis.name.as_str(), diagnosis.clone());
                }
            }
        }

        merged
            .safety_checks
            .extend(result.safety_checks.iter().cloned());
        merged.evidence.union_with(&result.evidence);
        merged
            .treatment_plan
            .extend(result.treatment_plan.iter().cloned());
        merged
            .recommendations
            .extend(result.recommendations.iter().cloned());
        merged
            .key_findings
            .extend(result.key_findings.iter().cloned());
        merged
            .risk_factors
            .extend(result.risk_factors.iter().cloned());

        if merged.raw_response.is_none() {
            merged.raw_response = result.raw_response.clone();
        }
    }

    merged.diagnoses = diagnoses.into_values().collect();
    merged
}
