//! Safety Review Prompt

use iatrikos_core::{AnalysisResult, Case};

/// Build the final safety-review prompt for a merged analysis.
pub fn build_safety_prompt(merged: &AnalysisResult, case: &Case) -> String {
    let diagnoses: Vec<serde_json::Value> = merged
        .diagnoses
        .iter()
        .map(|d| serde_json::json!({ "name": d.name, "confidence": d.confidence }))
        .collect();
    let diagnoses = serde_json::to_string_pretty(&diagnoses).unwrap_or_else(|_| "[]".to_string());

    let list = |items: Vec<&str>| {
        if items.is_empty() {
            "none".to_string()
        } else {
            items.join("; ")
        }
    };

    format!(
        r#"Perform a final safety review of this clinical analysis.

Patient Allergies: {allergies}
Current Medications: {medications}
Diagnoses: {diagnoses}
Treatment Plan: {plan}
Recommendations: {recommendations}

Verify:
1. No proposed treatment conflicts with a documented allergy
2. No drug interactions with current medications
3. All risk factors are addressed
4. Monitoring protocols are adequate

Respond with JSON in exactly this structure:
{{
    "safety_checks": [
        {{"check_type": "drug_interaction", "result": "pass", "recommendations": ["recommendation1"]}}
    ]
}}
Use "pass" or "fail" for result."#,
        allergies = list(case.allergies.iter().map(String::as_str).collect()),
        medications = list(case.medication_names()),
        diagnoses = diagnoses,
        plan = list(merged.treatment_plan.iter().map(String::as_str).collect()),
        recommendations = list(merged.recommendations.iter().map(String::as_str).collect()),
    )
}
