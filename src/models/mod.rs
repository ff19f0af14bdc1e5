//! Data Models
//!
//! Configuration structures. The analysis data model itself lives in
//! `iatrikos-core`.

pub mod settings;

pub use settings::{AnalysisSettings, EngineConfig, MAX_CONSENSUS_ATTEMPTS, MAX_CONSENSUS_ROUNDS};
