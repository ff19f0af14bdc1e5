//! Orchestration Engine
//!
//! Drives one case-analysis request through
//! `Pending -> RunningProducers -> Merging -> Validating -> Compiled`, or
//! `Failed` when something escapes the pipeline (malformed case, panic,
//! cancellation, deadline).
//!
//! Producer failures never fail the run. Each producer is guarded on its
//! own and degrades to the empty sentinel; only the Consensus producer is
//! retried, and only on rate limits. The safety gate's failures mean "no
//! additional checks".

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use iatrikos_core::{AnalysisResult, Case, ClinicalAnalysisRecord, SafetyCheck};
use iatrikos_knowledge::KnowledgeLookup;
use iatrikos_llm::GenerationProvider;
use iatrikos_safety::SafetyGate;

use super::compiler::compile;
use super::merge::merge;
use super::producers::{
    AnalysisProducer, ConsensusAnalysis, DirectAnalysis, OrchestratedAnalysis, ProducerKind,
};
use super::retry::{retry_with_backoff, FailureReason, RetryPolicy};
use crate::models::settings::EngineConfig;
use crate::storage::{AnalysisClaim, AnalysisRecordStore};
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// States and reports
// ============================================================================

/// Lifecycle of one analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisState {
    Pending,
    RunningProducers,
    Merging,
    Validating,
    Compiled,
    Failed,
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Compiled | AnalysisState::Failed)
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisState::Pending => write!(f, "PENDING"),
            AnalysisState::RunningProducers => write!(f, "RUNNING_PRODUCERS"),
            AnalysisState::Merging => write!(f, "MERGING"),
            AnalysisState::Validating => write!(f, "VALIDATING"),
            AnalysisState::Compiled => write!(f, "COMPILED"),
            AnalysisState::Failed => write!(f, "FAILED"),
        }
    }
}

/// What one producer contributed to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProducerOutcome {
    Contributed,
    Degraded { reason: FailureReason, attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerReport {
    pub producer: ProducerKind,
    pub outcome: ProducerOutcome,
}

/// Full account of one request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub record: ClinicalAnalysisRecord,
    pub final_state: AnalysisState,
    pub transitions: Vec<AnalysisState>,
    pub producer_outcomes: Vec<ProducerReport>,
    pub gate_checks_appended: usize,
    /// True when the request was turned away because the case was already
    /// being analyzed. `record` is then the in-flight snapshot.
    pub rejected: bool,
}

impl AnalysisReport {
    pub fn outcome_for(&self, producer: ProducerKind) -> Option<&ProducerOutcome> {
        self.producer_outcomes
            .iter()
            .find(|r| r.producer == producer)
            .map(|r| &r.outcome)
    }
}

struct StateTracker {
    case_id: String,
    states: Vec<AnalysisState>,
}

impl StateTracker {
    fn new(case_id: &str) -> Self {
        Self {
            case_id: case_id.to_string(),
            states: vec![AnalysisState::Pending],
        }
    }

    fn current(&self) -> AnalysisState {
        self.states
            .last()
            .copied()
            .unwrap_or(AnalysisState::Pending)
    }

    fn enter(&mut self, next: AnalysisState) {
        tracing::info!(
            case_id = %self.case_id,
            from = %self.current(),
            to = %next,
            "analysis state transition"
        );
        self.states.push(next);
    }
}

struct PipelineOutput {
    record: ClinicalAnalysisRecord,
    producer_outcomes: Vec<ProducerReport>,
    gate_checks_appended: usize,
}

// ============================================================================
// Producer set
// ============================================================================

/// The three producers a run fans out to.
#[derive(Clone)]
pub struct ProducerSet {
    pub direct: Arc<dyn AnalysisProducer>,
    pub orchestrated: Arc<dyn AnalysisProducer>,
    pub consensus: Arc<dyn AnalysisProducer>,
}

impl ProducerSet {
    /// The production producers sharing one generator and one knowledge
    /// lookup.
    pub fn standard(
        generator: Arc<dyn GenerationProvider>,
        knowledge: Arc<dyn KnowledgeLookup>,
        consensus_rounds: usize,
    ) -> Self {
        let direct = Arc::new(DirectAnalysis::new(generator.clone(), knowledge.clone()));
        let orchestrated = Arc::new(OrchestratedAnalysis::new(
            direct.clone(),
            generator.clone(),
            knowledge,
        ));
        let consensus = Arc::new(ConsensusAnalysis::new(generator, consensus_rounds));
        Self {
            direct,
            orchestrated,
            consensus,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct AnalysisEngine {
    producers: ProducerSet,
    gate: SafetyGate,
    store: Arc<dyn AnalysisRecordStore>,
    config: EngineConfig,
    retry: RetryPolicy,
}

impl AnalysisEngine {
    pub fn new(
        producers: ProducerSet,
        gate: SafetyGate,
        store: Arc<dyn AnalysisRecordStore>,
        config: EngineConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            producers,
            gate,
            store,
            config,
            retry,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a case. Always returns a well-formed record.
    pub async fn analyze(&self, case: &Case) -> ClinicalAnalysisRecord {
        self.run(case).await.record
    }

    pub async fn run(&self, case: &Case) -> AnalysisReport {
        self.run_with_cancel(case, CancellationToken::new()).await
    }

    /// Run one request. Cancelling `cancel` or exceeding the configured
    /// request timeout abandons in-flight producers and yields the failed
    /// record. Dropping the returned future marks the stored record failed
    /// and releases the case.
    pub async fn run_with_cancel(&self, case: &Case, cancel: CancellationToken) -> AnalysisReport {
        let case_id = case.case_id.as_str();
        let mut tracker = StateTracker::new(case_id);

        let initial = match self.store.begin(case_id).await {
            Ok(record) => record,
            Err(AppError::AnalysisInFlight(_)) => return self.reject_in_flight(case_id, tracker).await,
            Err(e) => {
                tracing::warn!(case_id = %case_id, error = %e, "failed to persist initial record");
                ClinicalAnalysisRecord::initial(case_id)
            }
        };
        let mut claim = AnalysisClaim::new(self.store.clone(), &initial);

        let deadline = self.config.request_timeout();
        let pipeline = AssertUnwindSafe(self.pipeline(case, &mut tracker)).catch_unwind();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::cancelled("analysis request cancelled")),
            result = tokio::time::timeout(deadline, pipeline) => match result {
                Err(_) => Err(AppError::cancelled(format!(
                    "analysis exceeded {}s deadline",
                    deadline.as_secs()
                ))),
                Ok(Err(_)) => Err(AppError::internal("analysis pipeline panicked")),
                Ok(Ok(result)) => result,
            },
        };

        let (record, producer_outcomes, gate_checks_appended) = match outcome {
            Ok(output) => (
                output.record.continuing(&initial),
                output.producer_outcomes,
                output.gate_checks_appended,
            ),
            Err(e) => {
                tracing::error!(case_id = %case_id, error = %e, "analysis failed");
                tracker.enter(AnalysisState::Failed);
                (
                    ClinicalAnalysisRecord::failed(case_id).continuing(&initial),
                    Vec::new(),
                    0,
                )
            }
        };

        if let Err(e) = self.store.save(&record).await {
            tracing::warn!(case_id = %case_id, error = %e, "failed to persist analysis record");
        }
        claim.complete();
        drop(claim);

        AnalysisReport {
            record,
            final_state: tracker.current(),
            transitions: tracker.states,
            producer_outcomes,
            gate_checks_appended,
            rejected: false,
        }
    }

    async fn reject_in_flight(&self, case_id: &str, tracker: StateTracker) -> AnalysisReport {
        tracing::warn!(case_id = %case_id, "analysis already in flight, rejecting request");
        let snapshot = match self.store.get(case_id).await {
            Ok(Some(record)) => record,
            Ok(None) => ClinicalAnalysisRecord::initial(case_id),
            Err(e) => {
                tracing::warn!(case_id = %case_id, error = %e, "failed to read in-flight record");
                ClinicalAnalysisRecord::initial(case_id)
            }
        };
        AnalysisReport {
            record: snapshot,
            final_state: tracker.current(),
            transitions: tracker.states,
            producer_outcomes: Vec::new(),
            gate_checks_appended: 0,
            rejected: true,
        }
    }

    async fn pipeline(&self, case: &Case, tracker: &mut StateTracker) -> AppResult<PipelineOutput> {
        case.validate()?;

        tracker.enter(AnalysisState::RunningProducers);
        let (results, producer_outcomes) = self.run_producers(case).await;

        tracker.enter(AnalysisState::Merging);
        let merged = merge(&results);

        tracker.enter(AnalysisState::Validating);
        let checks = self.validate(&merged, case).await;
        let gate_checks_appended = checks.len();

        let record = compile(&case.case_id, merged, checks);
        tracker.enter(AnalysisState::Compiled);

        Ok(PipelineOutput {
            record,
            producer_outcomes,
            gate_checks_appended,
        })
    }

    /// Results come back in invocation order: direct, orchestrated, consensus.
    async fn run_producers(&self, case: &Case) -> (Vec<AnalysisResult>, Vec<ProducerReport>) {
        let direct = self.run_guarded(self.producers.direct.as_ref(), case);
        let orchestrated = self.run_guarded(self.producers.orchestrated.as_ref(), case);
        let consensus = self.run_consensus(case);

        let outputs = if self.config.run_producers_concurrently {
            let (d, o, c) = tokio::join!(direct, orchestrated, consensus);
            [d, o, c]
        } else {
            [direct.await, orchestrated.await, consensus.await]
        };

        outputs.into_iter().unzip()
    }

    async fn run_guarded(
        &self,
        producer: &dyn AnalysisProducer,
        case: &Case,
    ) -> (AnalysisResult, ProducerReport) {
        let result = AssertUnwindSafe(producer.analyze(case)).catch_unwind().await;
        match result {
            Ok(outcome) => settle(producer.kind(), case, outcome, 1),
            Err(_) => degraded(producer.kind(), case, FailureReason::Panicked, 1),
        }
    }

    async fn run_consensus(&self, case: &Case) -> (AnalysisResult, ProducerReport) {
        let producer = self.producers.consensus.as_ref();
        let attempts = AtomicU32::new(0);

        let retried = retry_with_backoff(
            &self.retry,
            "consensus",
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                producer.analyze(case)
            },
            AppError::is_rate_limited,
        );

        match AssertUnwindSafe(retried).catch_unwind().await {
            Ok(outcome) => settle(producer.kind(), case, outcome.result, outcome.attempts),
            Err(_) => degraded(
                producer.kind(),
                case,
                FailureReason::Panicked,
                attempts.load(Ordering::SeqCst),
            ),
        }
    }

    async fn validate(&self, merged: &AnalysisResult, case: &Case) -> Vec<SafetyCheck> {
        let result = AssertUnwindSafe(self.gate.validate(merged, case))
            .catch_unwind()
            .await;
        match result {
            Ok(checks) => checks,
            Err(_) => {
                tracing::warn!(case_id = %case.case_id, "safety gate panicked, no additional checks");
                Vec::new()
            }
        }
    }
}

fn settle(
    kind: ProducerKind,
    case: &Case,
    outcome: AppResult<AnalysisResult>,
    attempts: u32,
) -> (AnalysisResult, ProducerReport) {
    match outcome {
        Ok(result) if result.is_empty() && result.raw_response.is_some() => {
            let (_, report) = degraded(kind, case, FailureReason::InvalidResponse, attempts);
            (result, report)
        }
        Ok(result) => (
            result,
            ProducerReport {
                producer: kind,
                outcome: ProducerOutcome::Contributed,
            },
        ),
        Err(e) => {
            tracing::warn!(
                case_id = %case.case_id,
                producer = %kind,
                attempts,
                error = %e,
                "producer failed"
            );
            degraded(kind, case, FailureReason::classify(&e), attempts)
        }
    }
}

fn degraded(
    kind: ProducerKind,
    case: &Case,
    reason: FailureReason,
    attempts: u32,
) -> (AnalysisResult, ProducerReport) {
    tracing::warn!(
        case_id = %case.case_id,
        producer = %kind,
        reason = %reason,
        attempts,
        "producer degraded to empty analysis"
    );
    (
        AnalysisResult::empty(),
        ProducerReport {
            producer: kind,
            outcome: ProducerOutcome::Degraded { reason, attempts },
        },
    )
}
