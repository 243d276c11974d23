//! Shared string and finding utilities for the scan pipeline.

use std::collections::HashMap;
use std::hash::Hash;

use super::types::Finding;

/// Qualifier words that precede an ingredient without changing what it is.
const LEADING_DESCRIPTORS: &[&str] = &[
    "organic", "dried", "roasted", "toasted", "ground", "raw", "fresh", "dehydrated",
    "powdered", "hydrolyzed", "hydrolysed", "modified", "partially", "hydrogenated",
    "natural", "pure", "whole", "refined", "unsalted", "salted",
];

/// Form words that follow an ingredient ("almond flour", "whey protein").
const TRAILING_DESCRIPTORS: &[&str] = &[
    "powder", "extract", "concentrate", "isolate", "solids", "flavouring", "flavoring",
    "flavour", "flavor", "oil", "flour", "juice", "paste", "protein", "pieces", "chips",
    "butter", "meal", "syrup",
];

/// Compute Levenshtein edit distance between two strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = if a_ch == b_ch { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// English plural to singular for one lowercase word. Short words are kept.
fn singularize(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["oes", "sses", "ches", "shes", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is")) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn singular_phrase(words: &[&str]) -> String {
    words.iter().map(|w| singularize(w)).collect::<Vec<_>>().join(" ")
}

/// Lookup variants of a normalized key, most specific first:
/// the singular form, then the key without descriptor words, then that
/// core in singular form. The key itself and variants under 2 chars are
/// not returned.
pub fn suffix_variants(key: &str) -> Vec<String> {
    let words: Vec<&str> = key.split(' ').filter(|w| !w.is_empty()).collect();
    let mut candidates = vec![singular_phrase(&words)];

    let mut start = 0;
    let mut end = words.len();
    while start < end && LEADING_DESCRIPTORS.contains(&words[start]) {
        start += 1;
    }
    while end > start && TRAILING_DESCRIPTORS.contains(&words[end - 1]) {
        end -= 1;
    }
    let core = &words[start..end];
    if !core.is_empty() && core.len() < words.len() {
        candidates.push(core.join(" "));
        candidates.push(singular_phrase(core));
    }

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate != key && candidate.chars().count() >= 2 && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Insert `finding` under `key`, or replace the finding already stored there
/// when the new one is stronger (higher severity, then higher confidence).
/// The replaced finding keeps its original position.
pub fn upsert_strongest<K: Eq + Hash>(
    findings: &mut Vec<Finding>,
    positions: &mut HashMap<K, usize>,
    key: K,
    finding: Finding,
) {
    match positions.get(&key) {
        Some(&idx) => {
            let current = &findings[idx];
            let stronger = finding
                .severity
                .cmp(&current.severity)
                .then(finding.confidence.total_cmp(&current.confidence))
                .is_gt();
            if stronger {
                findings[idx] = finding;
            }
        }
        None => {
            positions.insert(key, findings.len());
            findings.push(finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FindingKind, Severity};

    fn finding(id: &str, severity: Severity, confidence: f64) -> Finding {
        Finding {
            kind: FindingKind::Allergy,
            entry_id: id.into(),
            related_id: None,
            severity,
            matched_ingredient: id.into(),
            confidence,
            explanation: String::new(),
            advice: None,
            precautionary: false,
        }
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("peanut", "peanut"), 0);
        assert_eq!(edit_distance("peanut", "paenut"), 2);
        assert_eq!(edit_distance("wheat", "wheet"), 1);
        assert_eq!(edit_distance("", "soy"), 3);
        assert_eq!(edit_distance("café", "cafe"), 1);
    }

    #[test]
    fn singularize_common_plurals() {
        assert_eq!(singularize("berries"), "berry");
        assert_eq!(singularize("tomatoes"), "tomato");
        assert_eq!(singularize("peanuts"), "peanut");
        assert_eq!(singularize("peaches"), "peach");
        assert_eq!(singularize("hummus"), "hummus");
        assert_eq!(singularize("glass"), "glass");
        assert_eq!(singularize("oat"), "oat");
    }

    #[test]
    fn variants_strip_plural_and_descriptors() {
        assert_eq!(suffix_variants("cashews"), vec!["cashew"]);
        assert_eq!(
            suffix_variants("organic almonds flour"),
            vec!["organic almond flour", "almonds", "almond"]
        );
        assert_eq!(suffix_variants("whey powder"), vec!["whey"]);
    }

    #[test]
    fn variants_never_return_key_or_empty() {
        assert!(suffix_variants("milk").is_empty());
        assert!(suffix_variants("powder").is_empty());
    }

    #[test]
    fn upsert_keeps_position_and_strongest() {
        let mut findings = Vec::new();
        let mut positions = HashMap::new();
        upsert_strongest(&mut findings, &mut positions, "milk", finding("milk", Severity::Caution, 1.0));
        upsert_strongest(&mut findings, &mut positions, "soy", finding("soy", Severity::Info, 1.0));
        upsert_strongest(&mut findings, &mut positions, "milk", finding("milk", Severity::Severe, 0.7));
        upsert_strongest(&mut findings, &mut positions, "milk", finding("milk", Severity::Severe, 0.6));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].entry_id, "milk");
        assert_eq!(findings[0].severity, Severity::Severe);
        assert_eq!(findings[0].confidence, 0.7);
        assert_eq!(findings[1].entry_id, "soy");
    }
}
