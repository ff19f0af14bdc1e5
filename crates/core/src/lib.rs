//! Iatrikos Core
//!
//! Data model and parsing for the clinical analysis workspace. This crate
//! has no network or runtime dependencies; the generation provider, the
//! knowledge lookups and the orchestration engine all build on it.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `case` - The immutable clinical case submitted for analysis
//! - `analysis` - `AnalysisResult`, `Diagnosis`, `SafetyCheck`, `EvidenceBundle`, `ClinicalAnalysisRecord`
//! - `parse` - Generated-text parsing with the empty-sentinel fallback

pub mod analysis;
pub mod case;
pub mod error;
pub mod parse;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Case Model ─────────────────────────────────────────────────────────
pub use case::{Case, LabResult, Medication, VitalSigns};

// ── Analysis Model ─────────────────────────────────────────────────────
pub use analysis::{
    evidence_category, normalize_confidence, AnalysisResult, ClinicalAnalysisRecord, Diagnosis,
    EvidenceBundle, SafetyCheck, SafetyOutcome, PROGRESS_COMPLETE, TIME_REMAINING_DONE,
    TIME_REMAINING_ESTIMATING, TIME_REMAINING_FAILED,
};

// ── Parsing ────────────────────────────────────────────────────────────
pub use parse::{
    analysis_or_sentinel, extract_json, parse_analysis, parse_safety_checks, parse_text_list,
};
