//! Analysis Data Model
//!
//! In-flight `AnalysisResult` values produced by the analysis producers and
//! the persisted `ClinicalAnalysisRecord` compiled from them.
//!
//! Every field that has no meaningful order is a `BTreeSet`, so equality is
//! set equality and iteration order is stable for a fixed input.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// `time_remaining` value for a record whose analysis has not finished.
pub const TIME_REMAINING_ESTIMATING: &str = "estimating...";
/// `time_remaining` value for a compiled record.
pub const TIME_REMAINING_DONE: &str = "0";
/// `time_remaining` value for the catastrophic-failure sentinel.
pub const TIME_REMAINING_FAILED: &str = "failed";

/// Progress of a compiled record.
pub const PROGRESS_COMPLETE: f64 = 100.0;

// ============================================================================
// Diagnosis
// ============================================================================

/// A candidate diagnosis. Unique within a merged result by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub name: String,
    /// In [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: BTreeSet<String>,
}

impl Diagnosis {
    pub fn new<I, S>(name: impl Into<String>, confidence: f64, evidence: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            confidence: normalize_confidence(confidence),
            evidence: evidence.into_iter().map(Into::into).collect(),
        }
    }
}

/// Clamp a reported confidence into [0, 1].
///
/// Values in (1, 100] are read as percentages. NaN becomes 0.
pub fn normalize_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let value = if value > 1.0 && value <= 100.0 {
        value / 100.0
    } else {
        value
    };
    value.clamp(0.0, 1.0)
}

// ============================================================================
// Safety Checks
// ============================================================================

/// Outcome of a single safety check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyOutcome {
    Pass,
    Fail,
}

impl SafetyOutcome {
    /// Lenient parse: only an explicit "pass" passes.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("pass") {
            SafetyOutcome::Pass
        } else {
            SafetyOutcome::Fail
        }
    }
}

impl std::fmt::Display for SafetyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyOutcome::Pass => write!(f, "pass"),
            SafetyOutcome::Fail => write!(f, "fail"),
        }
    }
}

impl Serialize for SafetyOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SafetyOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SafetyOutcome::parse_lenient(&raw))
    }
}

/// A safety check. Never deduplicated: every producer's checks are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheck {
    pub check_type: String,
    pub result: SafetyOutcome,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl SafetyCheck {
    pub fn new(check_type: impl Into<String>, result: SafetyOutcome) -> Self {
        Self {
            check_type: check_type.into(),
            result,
            recommendations: Vec::new(),
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    pub fn passed(&self) -> bool {
        self.result == SafetyOutcome::Pass
    }
}

// ============================================================================
// Evidence
// ============================================================================

/// Well-known evidence categories.
pub mod evidence_category {
    pub const LITERATURE: &str = "literature";
    pub const CLINICAL_TRIALS: &str = "clinical_trials";
    pub const LAB_REFERENCES: &str = "lab_references";
    pub const DRUG_INFORMATION: &str = "drug_information";
}

/// Evidence grouped by category. Merging is a key-wise union, so no
/// category's entries are ever replaced by another producer's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceBundle(BTreeMap<String, BTreeSet<String>>);

impl EvidenceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entries under a category, creating it if needed.
    pub fn extend<I, S>(&mut self, category: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.0.entry(category.to_string()).or_default();
        entry.extend(items.into_iter().map(Into::into));
    }

    /// Key-wise union with another bundle.
    pub fn union_with(&mut self, other: &EvidenceBundle) {
        for (category, items) in &other.0 {
            self.extend(category, items.iter().cloned());
        }
    }

    pub fn get(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.0.get(category)
    }

    /// True when no category holds any entry.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|items| items.is_empty())
    }

    pub fn total_entries(&self) -> usize {
        self.0.values().map(|items| items.len()).sum()
    }
}

// ============================================================================
// AnalysisResult
// ============================================================================

/// One producer's (or the merged) analysis of a case.
///
/// `AnalysisResult::default()` is the empty sentinel used whenever a
/// producer cannot contribute usable output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(default)]
    pub safety_checks: Vec<SafetyCheck>,
    #[serde(default)]
    pub evidence: EvidenceBundle,
    #[serde(default)]
    pub treatment_plan: BTreeSet<String>,
    #[serde(default)]
    pub recommendations: BTreeSet<String>,
    #[serde(default)]
    pub key_findings: BTreeSet<String>,
    #[serde(default)]
    pub risk_factors: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AnalysisResult {
    /// The empty sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The empty sentinel carrying the unparsed text that produced it.
    pub fn empty_with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw_response: Some(raw.into()),
            ..Self::default()
        }
    }

    /// True when no content field holds anything. `raw_response` is ignored.
    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
            && self.safety_checks.is_empty()
            && self.evidence.is_empty()
            && self.treatment_plan.is_empty()
            && self.recommendations.is_empty()
            && self.key_findings.is_empty()
            && self.risk_factors.is_empty()
    }

    pub fn diagnosis_names(&self) -> Vec<&str> {
        self.diagnoses.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn find_diagnosis(&self, name: &str) -> Option<&Diagnosis> {
        self.diagnoses.iter().find(|d| d.name == name)
    }
}

// ============================================================================
// ClinicalAnalysisRecord
// ============================================================================

/// The persisted analysis of one case-analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalAnalysisRecord {
    pub id: Uuid,
    pub case_id: String,
    /// In [0, 100], non-decreasing over the record's lifetime
    pub progress: f64,
    /// Human-readable estimate, "0" when compiled, or "failed"
    pub time_remaining: String,
    pub diagnoses: Vec<Diagnosis>,
    pub safety_checks: Vec<SafetyCheck>,
    pub evidence: EvidenceBundle,
    pub treatment_plan: BTreeSet<String>,
    pub recommendations: BTreeSet<String>,
    pub key_findings: BTreeSet<String>,
    pub risk_factors: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClinicalAnalysisRecord {
    fn blank(case_id: &str, progress: f64, time_remaining: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            case_id: case_id.to_string(),
            progress,
            time_remaining: time_remaining.to_string(),
            diagnoses: Vec::new(),
            safety_checks: Vec::new(),
            evidence: EvidenceBundle::new(),
            treatment_plan: BTreeSet::new(),
            recommendations: BTreeSet::new(),
            key_findings: BTreeSet::new(),
            risk_factors: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The zero-progress record written when a request is accepted.
    pub fn initial(case_id: &str) -> Self {
        Self::blank(case_id, 0.0, TIME_REMAINING_ESTIMATING)
    }

    /// The fallback sentinel for a catastrophic engine failure.
    pub fn failed(case_id: &str) -> Self {
        Self::blank(case_id, 0.0, TIME_REMAINING_FAILED)
    }

    pub fn is_failed(&self) -> bool {
        self.time_remaining == TIME_REMAINING_FAILED
    }

    pub fn is_complete(&self) -> bool {
        self.time_remaining == TIME_REMAINING_DONE && self.progress >= PROGRESS_COMPLETE
    }

    /// Keep identity and creation time of an earlier write of this record.
    pub fn continuing(mut self, previous: &ClinicalAnalysisRecord) -> Self {
        self.id = previous.id;
        self.created_at = previous.created_at;
        self
    }

    /// True when every content field is empty.
    pub fn has_no_findings(&self) -> bool {
        self.diagnoses.is_empty()
            && self.safety_checks.is_empty()
            && self.key_findings.is_empty()
            && self.risk_factors.is_empty()
            && self.recommendations.is_empty()
    }
}
