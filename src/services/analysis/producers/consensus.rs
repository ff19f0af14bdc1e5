//! Consensus Analysis Producer
//!
//! A fixed-round discussion between a closed set of clinical roles. Each
//! round one role takes its turn, sees every earlier message and adds one
//! of its own. After the last round the transcript is structured into an
//! `AnalysisResult` in a single round-trip; an unreadable answer yields the
//! empty sentinel.
//!
//! Any generation failure aborts the discussion and is returned as is, so
//! the engine's backoff loop can retry the whole producer on rate limits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use iatrikos_core::{analysis_or_sentinel, AnalysisResult, Case};
use iatrikos_llm::GenerationProvider;

use super::{AnalysisProducer, ProducerKind};
use crate::models::settings::MAX_CONSENSUS_ROUNDS;
use crate::services::analysis::prompts::{discussion_turn_prompt, transcript_structuring_prompt};
use crate::utils::error::AppResult;

/// Discussion participants, in speaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusRole {
    Diagnostician,
    SafetyExpert,
    Researcher,
    TreatmentPlanner,
}

impl ConsensusRole {
    pub const ALL: [ConsensusRole; 4] = [
        ConsensusRole::Diagnostician,
        ConsensusRole::SafetyExpert,
        ConsensusRole::Researcher,
        ConsensusRole::TreatmentPlanner,
    ];

    /// Role speaking in `round` (0-based)
    pub fn for_round(round: usize) -> Self {
        Self::ALL[round % Self::ALL.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConsensusRole::Diagnostician => "Diagnostician",
            ConsensusRole::SafetyExpert => "SafetyExpert",
            ConsensusRole::Researcher => "Researcher",
            ConsensusRole::TreatmentPlanner => "TreatmentPlanner",
        }
    }

    pub fn focus(&self) -> &'static str {
        match self {
            ConsensusRole::Diagnostician => {
                "differential diagnosis with confidence levels and key findings"
            }
            ConsensusRole::SafetyExpert => {
                "allergies, drug interactions, contraindications and risk factors"
            }
            ConsensusRole::Researcher => "supporting evidence from literature and clinical trials",
            ConsensusRole::TreatmentPlanner => {
                "treatment plan, monitoring and follow-up recommendations"
            }
        }
    }
}

impl std::fmt::Display for ConsensusRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub struct ConsensusAnalysis {
    generator: Arc<dyn GenerationProvider>,
    rounds: usize,
}

impl ConsensusAnalysis {
    /// `rounds` is clamped into 1..=10.
    pub fn new(generator: Arc<dyn GenerationProvider>, rounds: usize) -> Self {
        Self {
            generator,
            rounds: rounds.clamp(1, MAX_CONSENSUS_ROUNDS as usize),
        }
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run the discussion and return the transcript, one entry per round.
    pub async fn discuss(&self, case: &Case) -> AppResult<Vec<String>> {
        let mut transcript: Vec<String> = Vec::with_capacity(self.rounds);

        for round in 0..self.rounds {
            let role = ConsensusRole::for_round(round);
            let prompt = discussion_turn_prompt(role, round, self.rounds, case, &transcript);
            let reply = self.generator.generate(&prompt).await?;

            tracing::debug!(
                case_id = %case.case_id,
                round = round + 1,
                role = role.name(),
                reply_len = reply.len(),
                "consensus turn complete"
            );
            transcript.push(format!("[{}]: {}", role.name(), reply.trim()));
        }

        Ok(transcript)
    }
}

#[async_trait]
impl AnalysisProducer for ConsensusAnalysis {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Consensus
    }

    async fn analyze(&self, case: &Case) -> AppResult<AnalysisResult> {
        let transcript = self.discuss(case).await?;
        let response = self
            .generator
            .generate(&transcript_structuring_prompt(case, &transcript))
            .await?;
        Ok(analysis_or_sentinel(&response))
    }
}
