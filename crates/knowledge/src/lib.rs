//! Iatrikos Knowledge
//!
//! Best-effort reference lookups used to enrich an analysis with evidence:
//! - `KnowledgeLookup` - the adapter trait (literature, drugs, trials, labs)
//! - `MedicalKnowledgeService` - HTTP implementation over public services
//! - `CachedKnowledge` - TTL cache decorator for any lookup
//! - `NoKnowledge` - a lookup that never finds anything
//!
//! No lookup ever returns an error to its caller; failures degrade to an
//! empty list.

pub mod cache;
pub mod config;
pub mod error;
pub mod lookup;
pub mod service;

pub use cache::CachedKnowledge;
pub use config::KnowledgeConfig;
pub use error::{KnowledgeError, KnowledgeResult};
pub use lookup::{KnowledgeLookup, LookupKind, NoKnowledge};
pub use service::MedicalKnowledgeService;
