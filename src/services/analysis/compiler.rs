//! Record Compiler
//!
//! Field mapping from a merged, validated analysis to the persisted record.

use chrono::Utc;

use iatrikos_core::{
    AnalysisResult, ClinicalAnalysisRecord, SafetyCheck, PROGRESS_COMPLETE, TIME_REMAINING_DONE,
};
use iatrikos_safety::append_checks;

/// Assemble the completed record for `case_id`.
///
/// `validated_checks` are appended after the merged producer checks.
pub fn compile(
    case_id: &str,
    mut merged: AnalysisResult,
    validated_checks: Vec<SafetyCheck>,
) -> ClinicalAnalysisRecord {
    append_checks(&mut merged, validated_checks);

    let mut record = ClinicalAnalysisRecord::initial(case_id);
    record.progress = PROGRESS_COMPLETE;
    record.time_remaining = TIME_REMAINING_DONE.to_string();
    record.diagnoses = merged.diagnoses;
    record.safety_checks = merged.safety_checks;
    record.evidence = merged.evidence;
    record.treatment_plan = merged.treatment_plan;
    record.recommendations = merged.recommendations;
    record.key_findings = merged.key_findings;
    record.risk_factors = merged.risk_factors;
    record.updated_at = Utc::now();
    record
}
