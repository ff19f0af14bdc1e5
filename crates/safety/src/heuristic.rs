//! Allergy Cross-Reference
//!
//! Deterministic check that runs alongside the generated safety review:
//! every documented allergen that appears in the merged treatment plan or
//! recommendations yields one failing `allergy_conflict` check.
//!
//! Only failures are emitted. A plan that mentions no allergen gains no
//! checks at all. Mentions are matched as whole words, and avoidance
//! wording ("avoid penicillin", "latex-free gloves") is not a conflict.

use std::collections::BTreeSet;

use iatrikos_core::{AnalysisResult, Case, SafetyCheck, SafetyOutcome};

/// Check type used for heuristic allergy findings.
pub const ALLERGY_CONFLICT: &str = "allergy_conflict";

/// Words that turn a following allergen mention into avoidance advice.
const NEGATION_CUES: &[&str] = &[
    "avoid",
    "avoiding",
    "no",
    "not",
    "non",
    "without",
    "except",
    "instead of",
    "allergy to",
    "allergic to",
];

/// How many words before a mention are searched for a negation cue.
const CUE_WINDOW_WORDS: usize = 4;

pub fn allergy_conflicts(merged: &AnalysisResult, case: &Case) -> Vec<SafetyCheck> {
    let allergens: BTreeSet<String> = case
        .allergies
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    allergens
        .iter()
        .filter_map(|allergen| {
            let mentions: Vec<&String> = merged
                .treatment_plan
                .iter()
                .chain(merged.recommendations.iter())
                .filter(|entry| mentions_allergen(entry, allergen))
                .collect();
            if mentions.is_empty() {
                return None;
            }

            let check = mentions.into_iter().fold(
                SafetyCheck::new(ALLERGY_CONFLICT, SafetyOutcome::Fail),
                |check, entry| {
                    check.with_recommendation(format!(
                        "Documented allergy to '{}' conflicts with: {}",
                        allergen, entry
                    ))
                },
            );
            Some(check)
        })
        .collect()
}

/// True when `entry` recommends the allergen rather than steering clear of it.
fn mentions_allergen(entry: &str, allergen: &str) -> bool {
    let text = entry.to_lowercase();
    text.match_indices(allergen).any(|(start, _)| {
        let before = &text[..start];
        let after = &text[start + allergen.len()..];
        let Some(after) = word_end(after) else {
            return false;
        };
        let starts_word = before
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());

        starts_word && !is_free_of(after) && !is_negated(before)
    })
}

/// Remainder after a whole-word mention, allowing a plural "s".
fn word_end(after: &str) -> Option<&str> {
    let rest = after
        .strip_prefix('s')
        .filter(|r| !r.starts_with(char::is_alphanumeric))
        .unwrap_or(after);
    if rest.starts_with(char::is_alphanumeric) {
        None
    } else {
        Some(rest)
    }
}

fn is_free_of(after: &str) -> bool {
    after.trim_start_matches(['-', ' ']).starts_with("free")
}

fn is_negated(before: &str) -> bool {
    let clause = before
        .rsplit([',', ';', '.', ':', '(', '\n'])
        .next()
        .unwrap_or(before);
    let words: Vec<&str> = clause
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let window = format!(
        " {} ",
        words[words.len().saturating_sub(CUE_WINDOW_WORDS)..].join(" ")
    );
    NEGATION_CUES
        .iter()
        .any(|cue| window.contains(&format!(" {} ", cue)))
}
