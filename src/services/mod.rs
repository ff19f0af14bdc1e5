//! Services
//!
//! Business logic services for the application.

pub mod analysis;

pub use analysis::{AnalysisEngine, ProducerSet};
