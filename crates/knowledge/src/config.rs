//! Knowledge Lookup Configuration

use serde::{Deserialize, Serialize};

/// Endpoints and limits for the reference lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// NCBI E-utilities root (esearch/esummary)
    #[serde(default = "default_pubmed_url")]
    pub pubmed_url: String,
    /// OpenFDA drug API root
    #[serde(default = "default_openfda_url")]
    pub openfda_url: String,
    /// ClinicalTrials.gov v2 API root
    #[serde(default = "default_clinical_trials_url")]
    pub clinical_trials_url: String,
    /// NLM Clinical Tables LOINC search endpoint
    #[serde(default = "default_loinc_url")]
    pub loinc_url: String,
    /// Maximum entries returned per lookup
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a non-empty lookup result stays cached (0 disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: u64,
    /// Sent to NCBI as the `email` parameter, as their usage policy asks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

fn default_pubmed_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

fn default_openfda_url() -> String {
    "https://api.fda.gov/drug".to_string()
}

fn default_clinical_trials_url() -> String {
    "https://clinicaltrials.gov/api/v2".to_string()
}

fn default_loinc_url() -> String {
    "https://clinicaltables.nlm.nih.gov/api/loinc_items/v3/search".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

fn default_cache_max_entries() -> u64 {
    500
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            pubmed_url: default_pubmed_url(),
            openfda_url: default_openfda_url(),
            clinical_trials_url: default_clinical_trials_url(),
            loinc_url: default_loinc_url(),
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            contact_email: None,
        }
    }
}

impl KnowledgeConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("pubmed_url", &self.pubmed_url),
            ("openfda_url", &self.openfda_url),
            ("clinical_trials_url", &self.clinical_trials_url),
            ("loinc_url", &self.loinc_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| format!("knowledge.{} '{}' is not a URL: {}", field, value, e))?;
        }
        if self.max_results == 0 || self.max_results > 50 {
            return Err(format!(
                "knowledge.max_results {} outside 1-50",
                self.max_results
            ));
        }
        if self.timeout_secs == 0 {
            return Err("knowledge.timeout_secs must be positive".to_string());
        }
        Ok(())
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl_secs > 0 && self.cache_max_entries > 0
    }
}
