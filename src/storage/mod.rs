//! Storage Layer
//!
//! Configuration file handling and the analysis record store.

pub mod config;
pub mod records;

pub use config::ConfigService;
pub use records::{AnalysisClaim, AnalysisRecordStore, InMemoryRecordStore};
