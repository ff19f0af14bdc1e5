//! Orchestrated Analysis Producer
//!
//! Runs the Direct producer, then adds a safety pass scoped to the case's
//! allergies and medications and a second evidence pass (lab references
//! and trials keyed by diagnosis plus chief complaint).
//!
//! The safety pass runs even when Direct found nothing: allergy and
//! medication checks still apply to a case with no diagnoses.

use std::sync::Arc;

use async_trait::async_trait;

use iatrikos_core::{evidence_category, parse_safety_checks, AnalysisResult, Case, EvidenceBundle};
use iatrikos_knowledge::KnowledgeLookup;
use iatrikos_llm::GenerationProvider;

use super::{AnalysisProducer, DirectAnalysis, ProducerKind};
use crate::services::analysis::prompts::orchestrated_safety_prompt;
use crate::utils::error::AppResult;

pub struct OrchestratedAnalysis {
    direct: Arc<DirectAnalysis>,
    generator: Arc<dyn GenerationProvider>,
    knowledge: Arc<dyn KnowledgeLookup>,
}

impl OrchestratedAnalysis {
    pub fn new(
        direct: Arc<DirectAnalysis>,
        generator: Arc<dyn GenerationProvider>,
        knowledge: Arc<dyn KnowledgeLookup>,
    ) -> Self {
        Self {
            direct,
            generator,
            knowledge,
        }
    }

    async fn additional_evidence(&self, analysis: &AnalysisResult, case: &Case) -> EvidenceBundle {
        let futures = analysis.diagnoses.iter().map(|diagnosis| {
            let topic = format!("{} {}", diagnosis.name, case.chief_complaint);
            async move {
                tokio::join!(
                    self.knowledge.lab_reference(&diagnosis.name),
                    self.knowledge.search_trials(&topic),
                )
            }
        });
        let results = futures_util::future::join_all(futures).await;

        let mut bundle = EvidenceBundle::new();
        for (labs, trials) in results {
            bundle.extend(evidence_category::LAB_REFERENCES, labs);
            bundle.extend(evidence_category::CLINICAL_TRIALS, trials);
        }
        bundle
    }
}

#[async_trait]
impl AnalysisProducer for OrchestratedAnalysis {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Orchestrated
    }

    async fn analyze(&self, case: &Case) -> AppResult<AnalysisResult> {
        let mut analysis = self.direct.analyze(case).await?;

        let response = self
            .generator
            .generate(&orchestrated_safety_prompt(&analysis, case))
            .await?;
        let checks = parse_safety_checks(&response);
        if checks.is_empty() {
            tracing::warn!(
                case_id = %case.case_id,
                producer = "orchestrated",
                "safety pass returned no readable checks"
            );
        }
        analysis.safety_checks.extend(checks);

        if !analysis.diagnoses.is_empty() {
            let evidence = self.additional_evidence(&analysis, case).await;
            analysis.evidence.union_with(&evidence);
        }

        Ok(analysis)
    }
}
