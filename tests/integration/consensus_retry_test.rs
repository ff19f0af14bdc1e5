//! Consensus Backoff Integration Tests
//!
//! Only rate-limited failures are retried, only for the Consensus producer,
//! at most three attempts with waits of one then two base delays.

use std::time::Duration;

use iatrikos_analysis::services::analysis::{
    AnalysisState, FailureReason, ProducerKind, ProducerOutcome,
};
use iatrikos_analysis::{AnalysisResult, AppError, Diagnosis, EngineConfig};

use crate::support::{
    harness, rate_limited, sample_case, server_error, ScriptedGenerator, ScriptedProducer,
    NO_GATE_CHECKS,
};

fn quiet_gate() -> ScriptedGenerator {
    ScriptedGenerator::new().otherwise(|_| Ok(NO_GATE_CHECKS.to_string()))
}

fn empty(kind: ProducerKind) -> ScriptedProducer {
    ScriptedProducer::returning(kind, AnalysisResult::empty())
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_consensus_gives_up_after_three_attempts() {
    let h = harness(
        empty(ProducerKind::Direct),
        empty(ProducerKind::Orchestrated),
        ScriptedProducer::failing(ProducerKind::Consensus, rate_limited()),
        quiet_gate(),
        EngineConfig::default(),
    );

    let started = tokio::time::Instant::now();
    let report = h.engine.run(&sample_case()).await;
    let elapsed = started.elapsed();

    assert_eq!(h.consensus.call_count(), 3);
    assert_eq!(
        report.outcome_for(ProducerKind::Consensus),
        Some(&ProducerOutcome::Degraded {
            reason: FailureReason::RateLimited,
            attempts: 3
        })
    );
    // waits of 1s and 2s; never more than 1+2+4 units
    assert!(elapsed >= Duration::from_secs(3));
    assert!(elapsed <= Duration::from_secs(7));

    assert_eq!(report.final_state, AnalysisState::Compiled);
    assert_eq!(report.record.time_remaining, "0");
}

#[tokio::test(start_paused = true)]
async fn test_consensus_recovers_after_rate_limit() {
    let consensus = ScriptedProducer::returning(
        ProducerKind::Consensus,
        AnalysisResult {
            diagnoses: vec![Diagnosis::new("Pneumonia", 0.85, ["consensus"])],
            ..Default::default()
        },
    )
    .then(Err(AppError::Generation(rate_limited())))
    .then(Err(AppError::Generation(rate_limited())));

    let h = harness(
        empty(ProducerKind::Direct),
        empty(ProducerKind::Orchestrated),
        consensus,
        quiet_gate(),
        EngineConfig::default(),
    );

    let report = h.engine.run(&sample_case()).await;

    assert_eq!(h.consensus.call_count(), 3);
    assert_eq!(
        report.outcome_for(ProducerKind::Consensus),
        Some(&ProducerOutcome::Contributed)
    );
    assert_eq!(report.record.diagnoses.len(), 1);
    assert_eq!(report.record.diagnoses[0].confidence, 0.85);
}

#[tokio::test(start_paused = true)]
async fn test_other_consensus_failures_are_not_retried() {
    let h = harness(
        empty(ProducerKind::Direct),
        empty(ProducerKind::Orchestrated),
        ScriptedProducer::failing(ProducerKind::Consensus, server_error()),
        quiet_gate(),
        EngineConfig::default(),
    );

    let started = tokio::time::Instant::now();
    let report = h.engine.run(&sample_case()).await;

    assert_eq!(h.consensus.call_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(
        report.outcome_for(ProducerKind::Consensus),
        Some(&ProducerOutcome::Degraded {
            reason: FailureReason::UpstreamError,
            attempts: 1
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_other_producers_are_never_retried() {
    let h = harness(
        ScriptedProducer::failing(ProducerKind::Direct, rate_limited()),
        ScriptedProducer::failing(ProducerKind::Orchestrated, rate_limited()),
        empty(ProducerKind::Consensus),
        quiet_gate(),
        EngineConfig::default(),
    );

    let report = h.engine.run(&sample_case()).await;

    assert_eq!(h.direct.call_count(), 1);
    assert_eq!(h.orchestrated.call_count(), 1);
    assert_eq!(
        report.outcome_for(ProducerKind::Direct),
        Some(&ProducerOutcome::Degraded {
            reason: FailureReason::RateLimited,
            attempts: 1
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_configured_attempts_respected() {
    let config = EngineConfig {
        consensus_max_attempts: 2,
        consensus_base_delay_ms: 500,
        ..EngineConfig::default()
    };
    let h = harness(
        empty(ProducerKind::Direct),
        empty(ProducerKind::Orchestrated),
        ScriptedProducer::failing(ProducerKind::Consensus, rate_limited()),
        quiet_gate(),
        config,
    );

    let started = tokio::time::Instant::now();
    h.engine.run(&sample_case()).await;

    assert_eq!(h.consensus.call_count(), 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(1));
}
