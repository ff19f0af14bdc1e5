//! Iatrikos Analysis
//!
//! Clinical case analysis orchestration. A case fans out to three
//! independent producers backed by a generative-text service, their
//! candidate analyses are merged, reviewed by a safety gate and compiled
//! into a `ClinicalAnalysisRecord`.
//!
//! It includes:
//! - The producers, merge engine, compiler and orchestration engine
//! - Configuration and the analysis record store
//! - Logging bootstrap and the composition root (`AppState`)

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod utils;

// ── Engine ─────────────────────────────────────────────────────────────
pub use services::analysis::{
    compile, merge, AnalysisEngine, AnalysisProducer, AnalysisReport, AnalysisState,
    FailureReason, ProducerKind, ProducerOutcome, ProducerReport, ProducerSet, RetryPolicy,
};

// ── Data Model ─────────────────────────────────────────────────────────
pub use iatrikos_core::{AnalysisResult, Case, ClinicalAnalysisRecord, Diagnosis, SafetyCheck};

pub use models::settings::{AnalysisSettings, EngineConfig};
pub use state::AppState;
pub use storage::{AnalysisRecordStore, ConfigService, InMemoryRecordStore};
pub use telemetry::init_tracing;
pub use utils::error::{AppError, AppResult};
