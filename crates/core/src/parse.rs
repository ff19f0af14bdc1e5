//! Generated-Text Parsing
//!
//! Turns free text returned by the generation service into the analysis
//! shapes. The strict functions (`parse_analysis`) report why parsing failed;
//! the boundary functions (`analysis_or_sentinel`, `parse_safety_checks`)
//! never fail and fall back to empty values instead.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::analysis::{
    normalize_confidence, AnalysisResult, Diagnosis, EvidenceBundle, SafetyCheck, SafetyOutcome,
};
use crate::error::{CoreError, CoreResult};

/// Locate and parse the JSON payload in a generated response.
///
/// Accepts a bare JSON document, one wrapped in a Markdown code fence, or
/// one surrounded by prose (the outermost `{...}` or `[...]` span is tried).
pub fn extract_json(response: &str) -> Option<Value> {
    let cleaned = strip_code_fences(response);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (cleaned.find(open), cleaned.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                    return Some(value);
                }
            }
        }
    }

    None
}

fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse a generated response as an `AnalysisResult`.
pub fn parse_analysis(response: &str) -> CoreResult<AnalysisResult> {
    let value = extract_json(response)
        .ok_or_else(|| CoreError::parse("no JSON document found in response"))?;
    let object = value
        .as_object()
        .ok_or_else(|| CoreError::parse("analysis response is not a JSON object"))?;

    Ok(AnalysisResult {
        diagnoses: read_diagnoses(object.get("diagnoses")),
        safety_checks: read_safety_checks(object.get("safety_checks")),
        evidence: read_evidence(object.get("evidence")),
        treatment_plan: read_string_set(object.get("treatment_plan")),
        recommendations: read_string_set(object.get("recommendations")),
        key_findings: read_string_set(object.get("key_findings")),
        risk_factors: read_string_set(object.get("risk_factors")),
        raw_response: None,
    })
}

/// Parse a response, or return the empty sentinel carrying the raw text.
pub fn analysis_or_sentinel(response: &str) -> AnalysisResult {
    match parse_analysis(response) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(error = %e, "analysis response unparseable, using empty sentinel");
            AnalysisResult::empty_with_raw(response)
        }
    }
}

/// Parse a list of safety checks. Accepts `{"safety_checks": [...]}` or a
/// bare array. Anything unreadable yields an empty list.
pub fn parse_safety_checks(response: &str) -> Vec<SafetyCheck> {
    match extract_json(response) {
        Some(Value::Object(object)) => read_safety_checks(object.get("safety_checks")),
        Some(array @ Value::Array(_)) => read_safety_checks(Some(&array)),
        _ => Vec::new(),
    }
}

/// Split a free-text answer into list items.
///
/// Bullet and numbering markers are stripped; blank lines and Markdown
/// headings are dropped.
pub fn parse_text_list(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("```"))
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            // "2.5 mg" is a dose, "2. Rest" is a numbered item
            if stripped.is_empty() || stripped.starts_with(char::is_whitespace) {
                return stripped.trim();
            }
        }
    }
    line.trim()
}

// ============================================================================
// Field readers
// ============================================================================

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn read_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_text).collect(),
        Some(Value::String(text)) => parse_text_list(text),
        Some(other) => value_to_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn read_string_set(value: Option<&Value>) -> BTreeSet<String> {
    read_strings(value).into_iter().collect()
}

fn read_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    normalize_confidence(raw)
}

fn read_diagnoses(value: Option<&Value>) -> Vec<Diagnosis> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => {
                let name = obj.get("name").and_then(value_to_text)?;
                Some(Diagnosis {
                    name,
                    confidence: read_confidence(obj.get("confidence")),
                    evidence: read_string_set(obj.get("evidence")),
                })
            }
            Value::String(name) if !name.trim().is_empty() => {
                Some(Diagnosis::new(name.trim(), 0.0, Vec::<String>::new()))
            }
            _ => None,
        })
        .collect()
}

fn read_safety_check(obj: &Map<String, Value>) -> Option<SafetyCheck> {
    let check_type = obj.get("check_type").and_then(value_to_text)?;
    let result = match obj.get("result") {
        Some(Value::String(s)) => SafetyOutcome::parse_lenient(s),
        Some(Value::Bool(true)) => SafetyOutcome::Pass,
        _ => SafetyOutcome::Fail,
    };
    Some(SafetyCheck {
        check_type,
        result,
        recommendations: read_strings(obj.get("recommendations")),
    })
}

fn read_safety_checks(value: Option<&Value>) -> Vec<SafetyCheck> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(read_safety_check)
        .collect()
}

fn read_evidence(value: Option<&Value>) -> EvidenceBundle {
    let mut bundle = EvidenceBundle::new();
    if let Some(Value::Object(categories)) = value {
        for (category, items) in categories {
            bundle.extend(category, read_strings(Some(items)));
        }
    }
    bundle
}
