//! Clinical Case Model
//!
//! The immutable input to an analysis run. A `Case` is owned by the caller
//! and only ever borrowed by producers, the safety gate and the engine.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Vital-sign snapshot taken when the case was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    /// Blood pressure as "systolic/diastolic", e.g. "120/80"
    pub blood_pressure: String,
    /// Beats per minute
    pub heart_rate: u32,
    /// Degrees Celsius
    pub temperature: f64,
    /// SpO2 percentage
    pub oxygen_saturation: u32,
    /// Breaths per minute
    pub respiratory_rate: u32,
    /// Kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Centimeters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    /// Additional free-form measurements (e.g. glucose)
    #[serde(default)]
    pub measurements: Vec<serde_json::Value>,
}

impl Default for VitalSigns {
    fn default() -> Self {
        Self {
            blood_pressure: "120/80".to_string(),
            heart_rate: 72,
            temperature: 37.0,
            oxygen_saturation: 98,
            respiratory_rate: 16,
            weight: None,
            height: None,
            bmi: None,
            measurements: Vec::new(),
        }
    }
}

/// A medication the patient is currently taking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub duration: String,
}

impl Medication {
    /// Create a medication with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A laboratory result attached to the case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabResult {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// A structured clinical case submitted for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub chief_complaint: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms_description: Option<String>,
    #[serde(default)]
    pub vital_signs: VitalSigns,
    #[serde(default)]
    pub current_medications: Vec<Medication>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_examination: Option<String>,
    #[serde(default)]
    pub lab_results: Vec<LabResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_history: Option<String>,
}

fn blood_pressure_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d{2,3}/\d{2,3}$").ok())
        .as_ref()
}

impl Case {
    /// Create a case with default vitals and empty lists.
    pub fn new(case_id: impl Into<String>, chief_complaint: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            patient_id: None,
            chief_complaint: chief_complaint.into(),
            symptoms: Vec::new(),
            symptoms_description: None,
            vital_signs: VitalSigns::default(),
            current_medications: Vec::new(),
            allergies: Vec::new(),
            physical_examination: None,
            lab_results: Vec::new(),
            family_history: None,
            social_history: None,
        }
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allergies<I, S>(mut self, allergies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allergies = allergies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_medications(mut self, medications: Vec<Medication>) -> Self {
        self.current_medications = medications;
        self
    }

    pub fn with_vital_signs(mut self, vital_signs: VitalSigns) -> Self {
        self.vital_signs = vital_signs;
        self
    }

    /// Names of the current medications, in case order.
    pub fn medication_names(&self) -> Vec<&str> {
        self.current_medications
            .iter()
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Check that the case is well-formed enough to analyze.
    ///
    /// A case that fails here is the malformed input that sends the
    /// orchestration engine straight to its failed state.
    pub fn validate(&self) -> CoreResult<()> {
        if self.case_id.trim().is_empty() {
            return Err(CoreError::invalid_case("case_id is empty"));
        }
        if self.chief_complaint.trim().is_empty() {
            return Err(CoreError::invalid_case("chief_complaint is empty"));
        }
        self.vital_signs.validate()
    }
}

impl VitalSigns {
    /// Range checks matching the intake form limits.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(pattern) = blood_pressure_pattern() {
            if !pattern.is_match(&self.blood_pressure) {
                return Err(CoreError::invalid_case(format!(
                    "blood_pressure '{}' is not in 'systolic/diastolic' form",
                    self.blood_pressure
                )));
            }
        }
        if self.heart_rate > 300 {
            return Err(CoreError::invalid_case(format!(
                "heart_rate {} exceeds 300",
                self.heart_rate
            )));
        }
        if !(25.0..=45.0).contains(&self.temperature) {
            return Err(CoreError::invalid_case(format!(
                "temperature {} outside 25-45 C",
                self.temperature
            )));
        }
        if self.oxygen_saturation > 100 {
            return Err(CoreError::invalid_case("oxygen_saturation exceeds 100"));
        }
        if self.respiratory_rate > 100 {
            return Err(CoreError::invalid_case("respiratory_rate exceeds 100"));
        }
        check_optional_range("weight", self.weight, 700.0)?;
        check_optional_range("height", self.height, 300.0)?;
        check_optional_range("bmi", self.bmi, 100.0)?;
        Ok(())
    }
}

fn check_optional_range(field: &str, value: Option<f64>, max: f64) -> CoreResult<()> {
    match value {
        Some(v) if !(0.0..=max).contains(&v) => Err(CoreError::invalid_case(format!(
            "{} {} outside 0-{}",
            field, v, max
        ))),
        _ => Ok(()),
    }
}
