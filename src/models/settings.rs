//! Settings Models
//!
//! Analysis configuration stored in config.json.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use iatrikos_knowledge::KnowledgeConfig;
use iatrikos_llm::{ProviderConfig, ProviderType};

/// Hard cap on simulated discussion rounds
pub const MAX_CONSENSUS_ROUNDS: u32 = 10;

/// Hard cap on consensus attempts (first try plus retries)
pub const MAX_CONSENSUS_ATTEMPTS: u32 = 3;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Generation provider
    #[serde(default)]
    pub generation: ProviderConfig,
    /// Reference lookups
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Orchestration engine
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), String> {
        self.generation.validate()?;
        self.knowledge.validate()?;
        self.engine.validate()
    }

    /// Fill the API key from the environment when the file carries none.
    ///
    /// Gemini reads `GEMINI_API_KEY` then `GOOGLE_API_KEY`; OpenAI reads
    /// `OPENAI_API_KEY`.
    pub fn apply_env_api_key<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.generation.api_key.is_some() {
            return;
        }
        let vars: &[&str] = match self.generation.provider {
            ProviderType::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ProviderType::OpenAI => &["OPENAI_API_KEY"],
        };
        self.generation.api_key = vars
            .iter()
            .filter_map(|var| lookup(var))
            .find(|key| !key.trim().is_empty());
    }
}

/// Orchestration engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consensus attempts including the first (1-3)
    #[serde(default = "default_consensus_max_attempts")]
    pub consensus_max_attempts: u32,
    /// Backoff before the second attempt; doubles for each later one
    #[serde(default = "default_consensus_base_delay_ms")]
    pub consensus_base_delay_ms: u64,
    /// Simulated discussion rounds (1-10)
    #[serde(default = "default_consensus_rounds")]
    pub consensus_rounds: u32,
    /// Deadline for a whole analysis request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Run the three producers concurrently instead of one after another
    #[serde(default = "default_run_producers_concurrently")]
    pub run_producers_concurrently: bool,
}

fn default_consensus_max_attempts() -> u32 {
    MAX_CONSENSUS_ATTEMPTS
}

fn default_consensus_base_delay_ms() -> u64 {
    1000
}

fn default_consensus_rounds() -> u32 {
    MAX_CONSENSUS_ROUNDS
}

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_run_producers_concurrently() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consensus_max_attempts: default_consensus_max_attempts(),
            consensus_base_delay_ms: default_consensus_base_delay_ms(),
            consensus_rounds: default_consensus_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
            run_producers_concurrently: default_run_producers_concurrently(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_CONSENSUS_ATTEMPTS).contains(&self.consensus_max_attempts) {
            return Err(format!(
                "engine.consensus_max_attempts {} outside 1-{}",
                self.consensus_max_attempts, MAX_CONSENSUS_ATTEMPTS
            ));
        }
        if !(1..=MAX_CONSENSUS_ROUNDS).contains(&self.consensus_rounds) {
            return Err(format!(
                "engine.consensus_rounds {} outside 1-{}",
                self.consensus_rounds, MAX_CONSENSUS_ROUNDS
            ));
        }
        if self.consensus_base_delay_ms > 60_000 {
            return Err("engine.consensus_base_delay_ms cannot exceed 60000".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("engine.request_timeout_secs must be positive".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
