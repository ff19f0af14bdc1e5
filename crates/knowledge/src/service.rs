//! Medical Knowledge Service
//!
//! HTTP implementation of `KnowledgeLookup` over public reference services:
//! - PubMed (NCBI E-utilities esearch + esummary)
//! - OpenFDA drug labels
//! - ClinicalTrials.gov v2 studies
//! - NLM Clinical Tables LOINC search
//!
//! The `fetch_*` methods report failures; the trait methods log them at
//! `warn` and return an empty list.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::KnowledgeConfig;
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::lookup::{KnowledgeLookup, LookupKind};

/// Maximum characters kept from a drug indication
const INDICATION_EXCERPT_CHARS: usize = 200;

pub struct MedicalKnowledgeService {
    config: KnowledgeConfig,
    client: reqwest::Client,
}

impl MedicalKnowledgeService {
    pub fn new(config: KnowledgeConfig) -> KnowledgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Iatrikos/0.1 (clinical-analysis)")
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    fn endpoint(base: &str, path: &str) -> KnowledgeResult<url::Url> {
        let joined = format!("{}/{}", base.trim_end_matches('/'), path);
        Ok(url::Url::parse(&joined)?)
    }

    async fn get_json(
        &self,
        service: &'static str,
        url: url::Url,
        query: &[(&str, String)],
    ) -> KnowledgeResult<Value> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KnowledgeError::Status {
                service,
                status: status.as_u16(),
            });
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| KnowledgeError::malformed(service, e.to_string()))
    }

    fn with_contact(&self, mut query: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        query.push(("tool", "iatrikos".to_string()));
        if let Some(email) = &self.config.contact_email {
            query.push(("email", email.clone()));
        }
        query
    }

    /// PubMed esearch for ids, then esummary for titles.
    pub async fn fetch_literature(&self, topic: &str) -> KnowledgeResult<Vec<String>> {
        let search_url = Self::endpoint(&self.config.pubmed_url, "esearch.fcgi")?;
        let search = self
            .get_json(
                "pubmed",
                search_url,
                &self.with_contact(vec![
                    ("db", "pubmed".to_string()),
                    ("term", topic.to_string()),
                    ("retmax", self.config.max_results.to_string()),
                    ("retmode", "json".to_string()),
                ]),
            )
            .await?;

        let ids = pubmed_ids(&search)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summary_url = Self::endpoint(&self.config.pubmed_url, "esummary.fcgi")?;
        let summary = self
            .get_json(
                "pubmed",
                summary_url,
                &self.with_contact(vec![
                    ("db", "pubmed".to_string()),
                    ("id", ids.join(",")),
                    ("retmode", "json".to_string()),
                ]),
            )
            .await?;

        Ok(render_pubmed_summaries(&ids, &summary))
    }

    /// OpenFDA label search.
    pub async fn fetch_drug_info(&self, name: &str) -> KnowledgeResult<Vec<String>> {
        let url = Self::endpoint(&self.config.openfda_url, "label.json")?;
        let payload = self
            .get_json(
                "openfda",
                url,
                &[
                    ("search", name.to_string()),
                    ("limit", self.config.max_results.to_string()),
                ],
            )
            .await?;
        Ok(render_drug_labels(&payload, name))
    }

    /// ClinicalTrials.gov v2 study search.
    pub async fn fetch_trials(&self, topic: &str) -> KnowledgeResult<Vec<String>> {
        let url = Self::endpoint(&self.config.clinical_trials_url, "studies")?;
        let payload = self
            .get_json(
                "clinicaltrials",
                url,
                &[
                    ("query.term", topic.to_string()),
                    ("pageSize", self.config.max_results.to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;
        Ok(render_trials(&payload))
    }

    /// NLM Clinical Tables LOINC search.
    pub async fn fetch_lab_reference(&self, name: &str) -> KnowledgeResult<Vec<String>> {
        let url = url::Url::parse(&self.config.loinc_url)?;
        let payload = self
            .get_json(
                "loinc",
                url,
                &[
                    ("terms", name.to_string()),
                    ("maxList", self.config.max_results.to_string()),
                    ("df", "LOINC_NUM,LONG_COMMON_NAME".to_string()),
                ],
            )
            .await?;
        render_loinc(&payload)
    }

    async fn best_effort<F>(&self, kind: LookupKind, query: &str, fetch: F) -> Vec<String>
    where
        F: std::future::Future<Output = KnowledgeResult<Vec<String>>>,
    {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match fetch.await {
            Ok(items) => {
                tracing::debug!(lookup = %kind, query, count = items.len(), "knowledge lookup");
                items
            }
            Err(e) => {
                tracing::warn!(lookup = %kind, query, error = %e, "knowledge lookup failed, using empty result");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl KnowledgeLookup for MedicalKnowledgeService {
    async fn search_literature(&self, topic: &str) -> Vec<String> {
        self.best_effort(LookupKind::Literature, topic, self.fetch_literature(topic))
            .await
    }

    async fn search_drug_info(&self, name: &str) -> Vec<String> {
        self.best_effort(LookupKind::DrugInfo, name, self.fetch_drug_info(name))
            .await
    }

    async fn search_trials(&self, topic: &str) -> Vec<String> {
        self.best_effort(LookupKind::Trials, topic, self.fetch_trials(topic))
            .await
    }

    async fn lab_reference(&self, name: &str) -> Vec<String> {
        self.best_effort(LookupKind::LabReference, name, self.fetch_lab_reference(name))
            .await
    }
}

// ============================================================================
// Payload rendering
// ============================================================================

fn pubmed_ids(search: &Value) -> KnowledgeResult<Vec<String>> {
    let list = search
        .pointer("/esearchresult/idlist")
        .and_then(Value::as_array)
        .ok_or_else(|| KnowledgeError::malformed("pubmed", "missing esearchresult.idlist"))?;
    Ok(list
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn render_pubmed_summaries(ids: &[String], summary: &Value) -> Vec<String> {
    ids.iter()
        .filter_map(|id| {
            let title = summary
                .pointer(&format!("/result/{}/title", id))
                .and_then(Value::as_str)?
                .trim();
            if title.is_empty() {
                None
            } else {
                Some(format!("PMID {}: {}", id, title))
            }
        })
        .collect()
}

fn first_string(value: &Value, pointer: &str) -> Option<String> {
    let field = value.pointer(pointer)?;
    let text = match field {
        Value::Array(items) => items.first()?.as_str()?,
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

fn render_drug_labels(payload: &Value, queried_name: &str) -> Vec<String> {
    let Some(results) = payload.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|label| {
            let indication = first_string(label, "/indications_and_usage")?;
            let brand = first_string(label, "/openfda/brand_name")
                .or_else(|| first_string(label, "/openfda/generic_name"))
                .unwrap_or_else(|| queried_name.to_string());
            Some(format!(
                "{}: {}",
                brand,
                excerpt(&indication, INDICATION_EXCERPT_CHARS)
            ))
        })
        .collect()
}

fn render_trials(payload: &Value) -> Vec<String> {
    let Some(studies) = payload.get("studies").and_then(Value::as_array) else {
        return Vec::new();
    };
    studies
        .iter()
        .filter_map(|study| {
            let id = study.pointer("/protocolSection/identificationModule")?;
            let nct = id.get("nctId")?.as_str()?;
            let title = id
                .get("briefTitle")
                .or_else(|| id.get("officialTitle"))
                .and_then(Value::as_str)
                .unwrap_or("untitled study");
            Some(format!("{}: {}", nct, title))
        })
        .collect()
}

/// Clinical Tables responses are `[total, codes, extra, display_rows]`.
fn render_loinc(payload: &Value) -> KnowledgeResult<Vec<String>> {
    let rows = payload
        .get(3)
        .and_then(Value::as_array)
        .ok_or_else(|| KnowledgeError::malformed("loinc", "missing display rows"))?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let num = row.get(0)?.as_str()?;
            let name = row.get(1).and_then(Value::as_str).unwrap_or_default();
            Some(format!("LOINC {}: {}", num, name))
        })
        .collect())
}
