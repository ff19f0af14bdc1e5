//! Clinical Analysis
//!
//! The orchestration core: three producers fan out over a case, their
//! results are merged, reviewed by the safety gate and compiled into a
//! `ClinicalAnalysisRecord`.
//!
//! ## Module Organization
//!
//! - `producers` - Direct, Orchestrated and Consensus producers
//! - `prompts` - Prompt construction
//! - `merge` - Set-union merge of producer results
//! - `compiler` - Record assembly
//! - `retry` - Failure classification and rate-limit backoff
//! - `engine` - The state machine tying it all together

pub mod compiler;
pub mod engine;
pub mod merge;
pub mod producers;
pub mod prompts;
pub mod retry;

pub use compiler::compile;
pub use engine::{
    AnalysisEngine, AnalysisReport, AnalysisState, ProducerOutcome, ProducerReport, ProducerSet,
};
pub use merge::merge;
pub use producers::{
    AnalysisProducer, ConsensusAnalysis, ConsensusRole, DirectAnalysis, OrchestratedAnalysis,
    ProducerKind,
};
pub use retry::{retry_with_backoff, FailureReason, RetryOutcome, RetryPolicy};
