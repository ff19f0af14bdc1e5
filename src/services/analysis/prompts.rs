//! Producer Prompts
//!
//! Prompt construction for the three producers. Every prompt that expects
//! structured output spells out the JSON shape the parsers in
//! `iatrikos_core::parse` read.

use iatrikos_core::{AnalysisResult, Case, Diagnosis};

use super::producers::consensus::ConsensusRole;

const ANALYSIS_SHAPE: &str = r#"{
    "diagnoses": [
        {"name": "Diagnosis Name", "confidence": 0.85, "evidence": ["supporting finding"]}
    ],
    "key_findings": ["finding1"],
    "risk_factors": ["risk1"],
    "safety_checks": [
        {"check_type": "drug_interaction", "result": "pass", "recommendations": ["recommendation1"]}
    ],
    "treatment_plan": ["step1"],
    "recommendations": ["recommendation1"]
}"#;

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.into_iter().filter(|s| !s.trim().is_empty()).collect();
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Render the case fields every prompt shares.
pub fn case_summary(case: &Case) -> String {
    let vitals = &case.vital_signs;
    let labs = join_or_none(case.lab_results.iter().map(|l| l.name.as_str()));
    let mut summary = format!(
        "Chief Complaint: {}\n\
         Symptoms: {}\n\
         Vital Signs: BP {}, HR {}, Temp {:.1}C, SpO2 {}%, RR {}\n\
         Current Medications: {}\n\
         Allergies: {}\n\
         Lab Results: {}",
        case.chief_complaint,
        join_or_none(case.symptoms.iter().map(String::as_str)),
        vitals.blood_pressure,
        vitals.heart_rate,
        vitals.temperature,
        vitals.oxygen_saturation,
        vitals.respiratory_rate,
        join_or_none(case.medication_names()),
        join_or_none(case.allergies.iter().map(String::as_str)),
        labs,
    );

    let optional = [
        ("Symptom Description", &case.symptoms_description),
        ("Physical Examination", &case.physical_examination),
        ("Family History", &case.family_history),
        ("Social History", &case.social_history),
    ];
    for (label, value) in optional {
        if let Some(text) = value.as_deref().filter(|t| !t.trim().is_empty()) {
            summary.push_str(&format!("\n{}: {}", label, text));
        }
    }
    summary
}

/// Initial structured analysis of a case.
pub fn analysis_prompt(case: &Case) -> String {
    format!(
        "Analyze this clinical case and provide a structured assessment.\n\n\
         {}\n\n\
         Respond with JSON in exactly this structure:\n{}\n\
         Confidence is a number between 0 and 1. Use \"pass\" or \"fail\" for result.",
        case_summary(case),
        ANALYSIS_SHAPE
    )
}

/// Treatment steps for one diagnosis, one step per line.
pub fn treatment_prompt(diagnosis: &Diagnosis, case: &Case) -> String {
    format!(
        "Propose a treatment plan for {name} (confidence {confidence:.2}).\n\n\
         {summary}\n\n\
         Consider current medications and allergies. List one treatment step per line, \
         without commentary.",
        name = diagnosis.name,
        confidence = diagnosis.confidence,
        summary = case_summary(case),
    )
}

/// One aggregate recommendations round-trip over the whole analysis.
pub fn recommendations_prompt(analysis: &AnalysisResult, case: &Case) -> String {
    format!(
        "Based on this clinical analysis, provide follow-up recommendations.\n\n\
         Chief Complaint: {complaint}\n\
         Diagnoses: {diagnoses}\n\
         Key Findings: {findings}\n\
         Risk Factors: {risks}\n\
         Treatment Plan: {plan}\n\n\
         Cover monitoring, follow-up and patient education. \
         List one recommendation per line, without commentary.",
        complaint = case.chief_complaint,
        diagnoses = join_or_none(analysis.diagnosis_names()),
        findings = join_or_none(analysis.key_findings.iter().map(String::as_str)),
        risks = join_or_none(analysis.risk_factors.iter().map(String::as_str)),
        plan = join_or_none(analysis.treatment_plan.iter().map(String::as_str)),
    )
}

/// Safety pass scoped to the case's allergies, medications and the
/// diagnoses just produced.
pub fn orchestrated_safety_prompt(analysis: &AnalysisResult, case: &Case) -> String {
    format!(
        r#"Validate the safety of the proposed analysis.

Allergies: {allergies}
Current Medications: {medications}
Diagnoses: {diagnoses}
Treatment Plan: {plan}

Check for allergy conflicts, drug interactions and contraindications.
Respond with JSON in exactly this structure:
{{
    "safety_checks": [
        {{"check_type": "allergy_check", "result": "pass", "recommendations": ["recommendation1"]}}
    ]
}}
Use "pass" or "fail" for result."#,
        allergies = join_or_none(case.allergies.iter().map(String::as_str)),
        medications = join_or_none(case.medication_names()),
        diagnoses = join_or_none(analysis.diagnosis_names()),
        plan = join_or_none(analysis.treatment_plan.iter().map(String::as_str)),
    )
}

/// One discussion turn for `role` given the transcript so far.
pub fn discussion_turn_prompt(
    role: ConsensusRole,
    round: usize,
    total_rounds: usize,
    case: &Case,
    transcript: &[String],
) -> String {
    let history = if transcript.is_empty() {
        "(no messages yet)".to_string()
    } else {
        transcript.join("\n\n")
    };
    format!(
        "You are the {role} in a clinical case review panel. Your focus: {focus}.\n\
         This is round {round} of {total}.\n\n\
         Case:\n{summary}\n\n\
         Discussion so far:\n{history}\n\n\
         Contribute your assessment from your focus area. Build on or challenge \
         earlier points. Be concise.",
        role = role.name(),
        focus = role.focus(),
        round = round + 1,
        total = total_rounds,
        summary = case_summary(case),
        history = history,
    )
}

/// Structure a finished discussion transcript into the analysis shape.
pub fn transcript_structuring_prompt(case: &Case, transcript: &[String]) -> String {
    format!(
        "Summarize this clinical case discussion into a structured analysis.\n\n\
         Case:\n{}\n\n\
         Discussion:\n{}\n\n\
         Respond with JSON in exactly this structure:\n{}\n\
         Confidence is a number between 0 and 1. Use \"pass\" or \"fail\" for result.",
        case_summary(case),
        transcript.join("\n\n"),
        ANALYSIS_SHAPE
    )
}
