//! Cached Knowledge Lookups
//!
//! A `KnowledgeLookup` decorator that keeps recent non-empty results in a
//! `mini_moka::sync::Cache`. Empty results are never stored, so a lookup
//! that failed upstream is retried on the next call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mini_moka::sync::{Cache, ConcurrentCacheExt};

use crate::config::KnowledgeConfig;
use crate::lookup::{KnowledgeLookup, LookupKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: LookupKind,
    query: String,
}

impl CacheKey {
    fn new(kind: LookupKind, query: &str) -> Self {
        Self {
            kind,
            query: query.trim().to_lowercase(),
        }
    }
}

pub struct CachedKnowledge {
    inner: Arc<dyn KnowledgeLookup>,
    cache: Cache<CacheKey, Vec<String>>,
}

impl CachedKnowledge {
    pub fn new(inner: Arc<dyn KnowledgeLookup>, ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    pub fn from_config(inner: Arc<dyn KnowledgeLookup>, config: &KnowledgeConfig) -> Self {
        Self::new(
            inner,
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        )
    }

    /// Returns the number of entries currently in the cache.
    pub fn entry_count(&self) -> u64 {
        self.cache.sync();
        self.cache.entry_count()
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.sync();
    }

    async fn cached(&self, kind: LookupKind, query: &str) -> Vec<String> {
        let key = CacheKey::new(kind, query);
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(lookup = %kind, query, "knowledge cache hit");
            return hit;
        }

        let items = self.inner.lookup(kind, query).await;
        if !items.is_empty() {
            self.cache.insert(key, items.clone());
        }
        items
    }
}

#[async_trait]
impl KnowledgeLookup for CachedKnowledge {
    async fn search_literature(&self, topic: &str) -> Vec<String> {
        self.cached(LookupKind::Literature, topic).await
    }

    async fn search_drug_info(&self, name: &str) -> Vec<String> {
        self.cached(LookupKind::DrugInfo, name).await
    }

    async fn search_trials(&self, topic: &str) -> Vec<String> {
        self.cached(LookupKind::Trials, topic).await
    }

    async fn lab_reference(&self, name: &str) -> Vec<String> {
        self.cached(LookupKind::LabReference, name).await
    }
}
