//! Direct Analysis Producer

use std::sync::Arc;

use async_trait::async_trait;

use iatrikos_core::{parse_analysis, AnalysisResult, Case};
use iatrikos_knowledge::KnowledgeLookup;
use iatrikos_llm::GenerationProvider;

use super::{
    gather_evidence, synthesize_recommendations, synthesize_treatment, AnalysisProducer,
    ProducerKind,
};
use crate::services::analysis::prompts::analysis_prompt;
use crate::utils::error::AppResult;

/// One structured analysis, enriched with evidence per diagnosis, a
/// treatment plan per diagnosis and one aggregate set of recommendations.
pub struct DirectAnalysis {
    generator: Arc<dyn GenerationProvider>,
    knowledge: Arc<dyn KnowledgeLookup>,
}

impl DirectAnalysis {
    pub fn new(generator: Arc<dyn GenerationProvider>, knowledge: Arc<dyn KnowledgeLookup>) -> Self {
        Self {
            generator,
            knowledge,
        }
    }
}

#[async_trait]
impl AnalysisProducer for DirectAnalysis {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Direct
    }

    async fn analyze(&self, case: &Case) -> AppResult<AnalysisResult> {
        let response = self.generator.generate(&analysis_prompt(case)).await?;

        let mut analysis = match parse_analysis(&response) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(
                    case_id = %case.case_id,
                    producer = "direct",
                    error = %e,
                    "analysis response unparseable, returning empty analysis"
                );
                return Ok(AnalysisResult::empty_with_raw(response));
            }
        };

        let evidence = gather_evidence(self.knowledge.as_ref(), &analysis.diagnoses).await;
        analysis.evidence.union_with(&evidence);

        let plan =
            synthesize_treatment(self.generator.as_ref(), &analysis.diagnoses, case).await?;
        analysis.treatment_plan.extend(plan);

        let recommendations =
            synthesize_recommendations(self.generator.as_ref(), &analysis, case).await?;
        analysis.recommendations.extend(recommendations);

        tracing::debug!(
            case_id = %case.case_id,
            diagnoses = analysis.diagnoses.len(),
            evidence = analysis.evidence.total_entries(),
            "direct analysis complete"
        );
        Ok(analysis)
    }
}
