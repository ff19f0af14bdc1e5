//! Knowledge Lookup Trait

use std::sync::Arc;

use async_trait::async_trait;

/// The four reference lookups, used as part of cache keys and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Literature,
    DrugInfo,
    Trials,
    LabReference,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Literature => "literature",
            LookupKind::DrugInfo => "drug_info",
            LookupKind::Trials => "trials",
            LookupKind::LabReference => "lab_reference",
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform interface to external reference lookups.
///
/// Every method is best-effort: implementations swallow their own failures
/// and return an empty list. Callers never see an error.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    /// Literature citations relevant to `topic`.
    async fn search_literature(&self, topic: &str) -> Vec<String>;

    /// Label information for a drug.
    async fn search_drug_info(&self, name: &str) -> Vec<String>;

    /// Clinical trials matching `topic`.
    async fn search_trials(&self, topic: &str) -> Vec<String>;

    /// Lab test reference entries for `name`.
    async fn lab_reference(&self, name: &str) -> Vec<String>;

    /// Dispatch by kind.
    async fn lookup(&self, kind: LookupKind, query: &str) -> Vec<String> {
        match kind {
            LookupKind::Literature => self.search_literature(query).await,
            LookupKind::DrugInfo => self.search_drug_info(query).await,
            LookupKind::Trials => self.search_trials(query).await,
            LookupKind::LabReference => self.lab_reference(query).await,
        }
    }
}

#[async_trait]
impl<T: KnowledgeLookup + ?Sized> KnowledgeLookup for Arc<T> {
    async fn search_literature(&self, topic: &str) -> Vec<String> {
        (**self).search_literature(topic).await
    }

    async fn search_drug_info(&self, name: &str) -> Vec<String> {
        (**self).search_drug_info(name).await
    }

    async fn search_trials(&self, topic: &str) -> Vec<String> {
        (**self).search_trials(topic).await
    }

    async fn lab_reference(&self, name: &str) -> Vec<String> {
        (**self).lab_reference(name).await
    }
}

/// A lookup that never finds anything. Used when enrichment is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeLookup for NoKnowledge {
    async fn search_literature(&self, _topic: &str) -> Vec<String> {
        Vec::new()
    }

    async fn search_drug_info(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }

    async fn search_trials(&self, _topic: &str) -> Vec<String> {
        Vec::new()
    }

    async fn lab_reference(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }
}
