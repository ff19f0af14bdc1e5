//! Test doubles for the generation and knowledge adapters and for
//! producers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use iatrikos_analysis::services::analysis::{
    AnalysisEngine, AnalysisProducer, ProducerKind, ProducerSet,
};
use iatrikos_analysis::{AnalysisResult, AppError, AppResult, Case, EngineConfig};
use iatrikos_analysis::{AnalysisRecordStore, InMemoryRecordStore};
use iatrikos_knowledge::KnowledgeLookup;
use iatrikos_llm::{GenerationProvider, LlmError, LlmResult};
use iatrikos_safety::SafetyGate;

pub fn rate_limited() -> LlmError {
    LlmError::RateLimited {
        message: "429 Too Many Requests".to_string(),
        retry_after: None,
    }
}

pub fn server_error() -> LlmError {
    LlmError::ServerError {
        message: "503 Service Unavailable".to_string(),
        status: Some(503),
    }
}

// ============================================================================
// ScriptedGenerator
// ============================================================================

type Responder = Box<dyn Fn(&str) -> LlmResult<String> + Send + Sync>;

/// Generation provider answering by prompt prefix. Prompts with no
/// matching route get the fallback answer.
pub struct ScriptedGenerator {
    routes: Vec<(String, Responder)>,
    fallback: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: Box::new(|_| Ok(String::new())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt fails with `err`.
    pub fn failing(err: LlmError) -> Self {
        Self::new().otherwise(move |_| Err(err.clone()))
    }

    pub fn route(
        mut self,
        prefix: &str,
        responder: impl Fn(&str) -> LlmResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((prefix.to_string(), Box::new(responder)));
        self
    }

    pub fn reply(self, prefix: &str, text: &str) -> Self {
        let text = text.to_string();
        self.route(prefix, move |_| Ok(text.clone()))
    }

    pub fn otherwise(
        mut self,
        responder: impl Fn(&str) -> LlmResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Box::new(responder);
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts_starting_with(&self, prefix: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        for (prefix, responder) in &self.routes {
            if prompt.starts_with(prefix.as_str()) {
                return responder(prompt);
            }
        }
        (self.fallback)(prompt)
    }
}

// ============================================================================
// StaticKnowledge
// ============================================================================

/// Knowledge lookup returning one canned entry per call.
#[derive(Default)]
pub struct StaticKnowledge {
    calls: AtomicU32,
}

impl StaticKnowledge {
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeLookup for StaticKnowledge {
    async fn search_literature(&self, topic: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![format!("PMID 1000: Review of {}", topic)]
    }

    async fn search_drug_info(&self, name: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![format!("{}: label excerpt", name)]
    }

    async fn search_trials(&self, topic: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![format!("NCT00000001: {}", topic)]
    }

    async fn lab_reference(&self, name: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![format!("LOINC 1-1: {}", name)]
    }
}

// ============================================================================
// ScriptedProducer
// ============================================================================

type ProducerScript = Box<dyn Fn() -> AppResult<AnalysisResult> + Send + Sync>;

/// Producer that plays back queued outcomes, then a fallback.
pub struct ScriptedProducer {
    kind: ProducerKind,
    queue: Mutex<VecDeque<AppResult<AnalysisResult>>>,
    fallback: ProducerScript,
    delay: Option<Duration>,
    panics: bool,
    calls: AtomicU32,
}

impl ScriptedProducer {
    fn with_fallback(kind: ProducerKind, fallback: ProducerScript) -> Self {
        Self {
            kind,
            queue: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            panics: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn returning(kind: ProducerKind, result: AnalysisResult) -> Self {
        Self::with_fallback(kind, Box::new(move || Ok(result.clone())))
    }

    pub fn failing(kind: ProducerKind, err: LlmError) -> Self {
        Self::with_fallback(kind, Box::new(move || Err(AppError::Generation(err.clone()))))
    }

    pub fn panicking(kind: ProducerKind) -> Self {
        let mut producer = Self::returning(kind, AnalysisResult::empty());
        producer.panics = true;
        producer
    }

    pub fn then(self, outcome: AppResult<AnalysisResult>) -> Self {
        self.queue.lock().unwrap().push_back(outcome);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProducer for ScriptedProducer {
    fn kind(&self) -> ProducerKind {
        self.kind
    }

    async fn analyze(&self, _case: &Case) -> AppResult<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics {
            panic!("scripted producer panic");
        }
        let queued = self.queue.lock().unwrap().pop_front();
        match queued {
            Some(outcome) => outcome,
            None => (self.fallback)(),
        }
    }
}

// ============================================================================
// Engine harness
// ============================================================================

pub struct Harness {
    pub engine: AnalysisEngine,
    pub store: Arc<InMemoryRecordStore>,
    pub direct: Arc<ScriptedProducer>,
    pub orchestrated: Arc<ScriptedProducer>,
    pub consensus: Arc<ScriptedProducer>,
}

/// Gate answer with no checks.
pub const NO_GATE_CHECKS: &str = r#"{"safety_checks": []}"#;

pub fn harness(
    direct: ScriptedProducer,
    orchestrated: ScriptedProducer,
    consensus: ScriptedProducer,
    gate: ScriptedGenerator,
    config: EngineConfig,
) -> Harness {
    let direct = Arc::new(direct);
    let orchestrated = Arc::new(orchestrated);
    let consensus = Arc::new(consensus);
    let store = Arc::new(InMemoryRecordStore::new());

    let producers = ProducerSet {
        direct: direct.clone(),
        orchestrated: orchestrated.clone(),
        consensus: consensus.clone(),
    };
    let store_dyn: Arc<dyn AnalysisRecordStore> = store.clone();
    let engine = AnalysisEngine::new(producers, SafetyGate::new(Arc::new(gate)), store_dyn, config);

    Harness {
        engine,
        store,
        direct,
        orchestrated,
        consensus,
    }
}

pub fn sample_case() -> Case {
    Case::new("case-001", "Productive cough and fever for three days")
        .with_symptoms(["cough", "fever", "shortness of breath"])
        .with_allergies(["penicillin"])
}
