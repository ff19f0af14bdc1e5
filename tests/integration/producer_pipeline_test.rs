//! Producer Pipeline Integration Tests
//!
//! The real Direct, Orchestrated and Consensus producers wired through
//! `AppState` over a scripted generator and static knowledge lookups.

use std::sync::Arc;

use iatrikos_analysis::services::analysis::{
    AnalysisState, FailureReason, ProducerKind, ProducerOutcome,
};
use iatrikos_analysis::{AnalysisSettings, AppState, InMemoryRecordStore};
use iatrikos_core::{evidence_category, SafetyOutcome};

use crate::support::{sample_case, server_error, ScriptedGenerator, StaticKnowledge};

const ANALYSIS_JSON: &str = r#"```json
{
    "diagnoses": [{"name": "Community-acquired pneumonia", "confidence": 0.82, "evidence": ["crackles"]}],
    "key_findings": ["fever 38.9C", "productive cough"],
    "risk_factors": ["smoker"],
    "safety_checks": []
}
```"#;

const STRUCTURED_JSON: &str = r#"{
    "diagnoses": [
        {"name": "Community-acquired pneumonia", "confidence": 91, "evidence": ["panel consensus"]},
        {"name": "Acute bronchitis", "confidence": 0.2}
    ],
    "risk_factors": ["age > 65"],
    "safety_checks": [{"check_type": "drug_interaction", "result": "pass"}]
}"#;

fn scripted_generator() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .reply("Analyze this clinical case", ANALYSIS_JSON)
        .reply(
            "Propose a treatment plan",
            "1. Penicillin V 500mg four times daily\n2. Oral fluids",
        )
        .reply(
            "Based on this clinical analysis",
            "- Repeat chest xray in 6 weeks\n- Smoking cessation",
        )
        .reply(
            "Validate the safety",
            r#"{"safety_checks": [{"check_type": "allergy_check", "result": "fail", "recommendations": ["Penicillin allergy documented"]}]}"#,
        )
        .reply("You are the", "I agree the picture fits pneumonia.")
        .reply("Summarize this clinical case discussion", STRUCTURED_JSON)
        .reply(
            "Perform a final safety review",
            r#"{"safety_checks": [{"check_type": "monitoring", "result": "pass"}]}"#,
        )
}

fn settings(rounds: u32) -> AnalysisSettings {
    let mut settings = AnalysisSettings::default();
    settings.engine.consensus_rounds = rounds;
    settings
}

#[tokio::test]
async fn test_full_pipeline_over_real_producers() {
    let generator = Arc::new(scripted_generator());
    let knowledge = Arc::new(StaticKnowledge::default());
    let state = AppState::with_services(
        settings(4),
        generator.clone(),
        knowledge.clone(),
        Arc::new(InMemoryRecordStore::new()),
    );

    let report = state.engine().run(&sample_case()).await;
    let record = &report.record;

    assert_eq!(report.final_state, AnalysisState::Compiled);
    assert!(report
        .producer_outcomes
        .iter()
        .all(|r| r.outcome == ProducerOutcome::Contributed));

    // merged diagnoses: max confidence, union of evidence
    assert_eq!(record.diagnoses.len(), 2);
    let cap = record
        .diagnoses
        .iter()
        .find(|d| d.name == "Community-acquired pneumonia")
        .unwrap();
    assert_eq!(cap.confidence, 0.91);
    assert!(cap.evidence.contains("crackles"));
    assert!(cap.evidence.contains("panel consensus"));

    // synthesis from Direct (run by both Direct and Orchestrated)
    assert!(record
        .treatment_plan
        .contains("Penicillin V 500mg four times daily"));
    assert!(record.recommendations.contains("Smoking cessation"));
    assert!(record.risk_factors.contains("smoker"));
    assert!(record.risk_factors.contains("age > 65"));

    // evidence from both lookup passes
    assert!(record.evidence.get(evidence_category::LITERATURE).is_some());
    assert!(record.evidence.get(evidence_category::DRUG_INFORMATION).is_some());
    assert!(record
        .evidence
        .get(evidence_category::LAB_REFERENCES)
        .unwrap()
        .contains("LOINC 1-1: Community-acquired pneumonia"));
    assert!(record
        .evidence
        .get(evidence_category::CLINICAL_TRIALS)
        .unwrap()
        .iter()
        .any(|t| t.contains("Productive cough and fever")));

    // orchestrated check, consensus check, gate check, allergy heuristic
    let types: Vec<&str> = record
        .safety_checks
        .iter()
        .map(|c| c.check_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec!["allergy_check", "drug_interaction", "monitoring", "allergy_conflict"]
    );
    assert_eq!(record.safety_checks[3].result, SafetyOutcome::Fail);
    assert_eq!(report.gate_checks_appended, 2);

    // four discussion turns, one structuring call
    assert_eq!(generator.prompts_starting_with("You are the"), 4);
    assert_eq!(
        generator.prompts_starting_with("Summarize this clinical case discussion"),
        1
    );
    assert!(knowledge.call_count() > 0);
}

#[tokio::test]
async fn test_unreachable_generator_degrades_every_producer() {
    let generator = Arc::new(ScriptedGenerator::failing(server_error()));
    let state = AppState::with_services(
        settings(10),
        generator.clone(),
        Arc::new(StaticKnowledge::default()),
        Arc::new(InMemoryRecordStore::new()),
    );

    let report = state.engine().run(&sample_case()).await;
    let record = &report.record;

    // reachable service, nothing usable: compiled and empty, not failed
    assert_eq!(report.final_state, AnalysisState::Compiled);
    assert_eq!(record.progress, 100.0);
    assert_eq!(record.time_remaining, "0");
    assert!(record.has_no_findings());
    assert!(record.evidence.is_empty());
    assert!(report.producer_outcomes.iter().all(|r| r.outcome
        == ProducerOutcome::Degraded {
            reason: FailureReason::UpstreamError,
            attempts: 1
        }));
    assert_eq!(
        report.outcome_for(ProducerKind::Consensus),
        Some(&ProducerOutcome::Degraded {
            reason: FailureReason::UpstreamError,
            attempts: 1
        })
    );
    // one analysis call each for Direct and Orchestrated, one consensus turn, one gate call
    assert_eq!(generator.call_count(), 4);
}

#[tokio::test]
async fn test_prose_answers_degrade_to_sentinel() {
    let generator = Arc::new(
        ScriptedGenerator::new().otherwise(|_| Ok("I'm not able to structure this.".to_string())),
    );
    let state = AppState::with_services(
        settings(2),
        generator,
        Arc::new(StaticKnowledge::default()),
        Arc::new(InMemoryRecordStore::new()),
    );

    let report = state.engine().run(&sample_case()).await;

    assert_eq!(report.final_state, AnalysisState::Compiled);
    assert!(report.record.has_no_findings());
    for kind in [ProducerKind::Direct, ProducerKind::Consensus] {
        assert_eq!(
            report.outcome_for(kind),
            Some(&ProducerOutcome::Degraded {
                reason: FailureReason::InvalidResponse,
                attempts: 1
            })
        );
    }
}
