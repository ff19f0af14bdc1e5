//! Application State
//!
//! Composition root: builds the generation provider, the knowledge lookup,
//! the safety gate, the record store and the engine from settings, and
//! hands the engine its collaborators explicitly.

use std::sync::Arc;

use iatrikos_knowledge::{CachedKnowledge, KnowledgeLookup, MedicalKnowledgeService};
use iatrikos_llm::{create_provider, GenerationProvider};
use iatrikos_safety::SafetyGate;

use crate::models::settings::AnalysisSettings;
use crate::services::analysis::{AnalysisEngine, ProducerSet};
use crate::storage::{AnalysisRecordStore, InMemoryRecordStore};
use crate::utils::error::{AppError, AppResult};

/// Application state owning every long-lived service
pub struct AppState {
    /// Settings the services were built from
    settings: AnalysisSettings,
    /// Shared generation provider
    generator: Arc<dyn GenerationProvider>,
    /// Reference lookups, cached when enabled
    knowledge: Arc<dyn KnowledgeLookup>,
    /// Persisted analysis records
    store: Arc<dyn AnalysisRecordStore>,
    /// The orchestration engine
    engine: Arc<AnalysisEngine>,
}

impl AppState {
    /// Build all services from validated settings.
    pub fn from_settings(settings: AnalysisSettings) -> AppResult<Self> {
        settings.validate().map_err(AppError::config)?;

        let generator = create_provider(settings.generation.clone())?;

        let service = MedicalKnowledgeService::new(settings.knowledge.clone())
            .map_err(|e| AppError::config(format!("knowledge service: {}", e)))?;
        let knowledge: Arc<dyn KnowledgeLookup> = if settings.knowledge.cache_enabled() {
            Arc::new(CachedKnowledge::from_config(
                Arc::new(service),
                &settings.knowledge,
            ))
        } else {
            Arc::new(service)
        };

        let store: Arc<dyn AnalysisRecordStore> = Arc::new(InMemoryRecordStore::new());
        Ok(Self::with_services(settings, generator, knowledge, store))
    }

    /// Assemble state around already-built collaborators.
    pub fn with_services(
        settings: AnalysisSettings,
        generator: Arc<dyn GenerationProvider>,
        knowledge: Arc<dyn KnowledgeLookup>,
        store: Arc<dyn AnalysisRecordStore>,
    ) -> Self {
        let producers = ProducerSet::standard(
            generator.clone(),
            knowledge.clone(),
            settings.engine.consensus_rounds as usize,
        );
        let gate = SafetyGate::new(generator.clone());
        let engine = Arc::new(AnalysisEngine::new(
            producers,
            gate,
            store.clone(),
            settings.engine.clone(),
        ));

        tracing::info!(
            provider = generator.name(),
            model = generator.model(),
            consensus_rounds = settings.engine.consensus_rounds,
            "analysis services ready"
        );

        Self {
            settings,
            generator,
            knowledge,
            store,
            engine,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn generator(&self) -> Arc<dyn GenerationProvider> {
        self.generator.clone()
    }

    pub fn knowledge(&self) -> Arc<dyn KnowledgeLookup> {
        self.knowledge.clone()
    }

    pub fn store(&self) -> Arc<dyn AnalysisRecordStore> {
        self.store.clone()
    }

    pub fn engine(&self) -> Arc<AnalysisEngine> {
        self.engine.clone()
    }
}
