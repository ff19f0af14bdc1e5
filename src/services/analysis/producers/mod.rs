//! Analysis Producers
//!
//! Three independent strategies that each turn a `Case` into a candidate
//! `AnalysisResult`:
//!
//! - `DirectAnalysis` - one structured analysis plus evidence, treatment
//!   and recommendation synthesis
//! - `OrchestratedAnalysis` - Direct plus a safety pass and extra evidence
//! - `ConsensusAnalysis` - a fixed-round multi-role discussion structured
//!   into the same shape
//!
//! Producers return `Err` for upstream failures; the engine decides what a
//! failure means for the run. Unparseable output is not an error: it yields
//! the empty sentinel with `raw_response` set.

pub mod consensus;
pub mod direct;
pub mod orchestrated;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use iatrikos_core::{
    evidence_category, parse_text_list, AnalysisResult, Case, Diagnosis, EvidenceBundle,
};
use iatrikos_knowledge::KnowledgeLookup;
use iatrikos_llm::GenerationProvider;

use super::prompts::{recommendations_prompt, treatment_prompt};
use crate::utils::error::AppResult;

pub use consensus::{ConsensusAnalysis, ConsensusRole};
pub use direct::DirectAnalysis;
pub use orchestrated::OrchestratedAnalysis;

/// Which producer a result or outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    Direct,
    Orchestrated,
    Consensus,
}

impl ProducerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerKind::Direct => "direct",
            ProducerKind::Orchestrated => "orchestrated",
            ProducerKind::Consensus => "consensus",
        }
    }
}

impl std::fmt::Display for ProducerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy that produces one candidate analysis of a case.
#[async_trait]
pub trait AnalysisProducer: Send + Sync {
    fn kind(&self) -> ProducerKind;

    async fn analyze(&self, case: &Case) -> AppResult<AnalysisResult>;
}

// ============================================================================
// Shared synthesis
// ============================================================================

/// Literature, trials and drug information for every diagnosis.
///
/// Lookups for all diagnoses run concurrently. Lookups never fail, so the
/// bundle may simply be empty.
pub async fn gather_evidence(
    knowledge: &dyn KnowledgeLookup,
    diagnoses: &[Diagnosis],
) -> EvidenceBundle {
    let futures = diagnoses.iter().map(|diagnosis| async move {
        let name = diagnosis.name.as_str();
        tokio::join!(
            knowledge.search_literature(name),
            knowledge.search_trials(name),
            knowledge.search_drug_info(name),
        )
    });
    let results = futures_util::future::join_all(futures).await;

    let mut bundle = EvidenceBundle::new();
    for (literature, trials, drugs) in results {
        bundle.extend(evidence_category::LITERATURE, literature);
        bundle.extend(evidence_category::CLINICAL_TRIALS, trials);
        bundle.extend(evidence_category::DRUG_INFORMATION, drugs);
    }
    bundle
}

/// One treatment round-trip per diagnosis, in diagnosis order.
pub async fn synthesize_treatment(
    generator: &dyn GenerationProvider,
    diagnoses: &[Diagnosis],
    case: &Case,
) -> AppResult<BTreeSet<String>> {
    let mut plan = BTreeSet::new();
    for diagnosis in diagnoses {
        let response = generator.generate(&treatment_prompt(diagnosis, case)).await?;
        plan.extend(parse_text_list(&response));
    }
    Ok(plan)
}

/// One aggregate recommendations round-trip.
pub async fn synthesize_recommendations(
    generator: &dyn GenerationProvider,
    analysis: &AnalysisResult,
    case: &Case,
) -> AppResult<BTreeSet<String>> {
    let response = generator
        .generate(&recommendations_prompt(analysis, case))
        .await?;
    Ok(parse_text_list(&response).into_iter().collect())
}
