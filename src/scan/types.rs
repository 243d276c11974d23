use std::ops::Range;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::knowledge::KnowledgeVersion;
use crate::models::{
    EntryKind, EntryRef, FindingKind, MatchMethod, RiskLevel, Severity, UserProfile,
};

/// Advisory finding id for ingredients that matched nothing.
pub const UNRESOLVED_ADVISORY_ID: &str = "unresolved_ingredients";
/// Advisory finding id for a scan with no ingredient list at all.
pub const NO_ANALYSIS_ADVISORY_ID: &str = "analysis_unavailable";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// What the ingredient acquisition layer (barcode lookup, OCR, manual entry)
/// hands to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientSource {
    Text(String),
    /// Extraction failed upstream. Not an engine error: the scan still
    /// returns a report, flagged as not analyzed.
    Unavailable { reason: String },
}

impl IngredientSource {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Scan entry point.
pub trait Scanner {
    /// Never fails: missing input is reported inside the `RiskReport`.
    fn scan(&self, source: &IngredientSource, profile: &UserProfile) -> RiskReport;
}

// ---------------------------------------------------------------------------
// Normalizer output
// ---------------------------------------------------------------------------

/// One knowledge base candidate for a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientMatch {
    pub entry: EntryRef,
    /// Match quality, reduced when the synonym is ambiguous.
    pub confidence: f64,
    pub method: MatchMethod,
    /// The key maps to several entries of the same kind.
    pub ambiguous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIngredient {
    /// The ingredient as written on the label.
    pub raw_text: String,
    /// Byte range of `raw_text` in the scanned text.
    pub span: Range<usize>,
    /// Matched index key, or the normalized token when unresolved.
    pub canonical_token: String,
    /// Every candidate entry, best first. Empty when unresolved.
    pub matches: Vec<IngredientMatch>,
    /// 1.0 exact, 0.85 after suffix stripping, edit-distance score for fuzzy
    /// hits, 0.0 when unresolved.
    pub confidence: f64,
    /// Came from a "may contain" statement rather than the ingredient list.
    #[serde(default)]
    pub precautionary: bool,
}

impl NormalizedIngredient {
    pub fn is_resolved(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Best unambiguous candidate id, if any.
    pub fn matched_entry_id(&self) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| !m.ambiguous)
            .map(|m| m.entry.id.as_str())
    }

    pub fn matches_of(&self, kind: EntryKind) -> impl Iterator<Item = &IngredientMatch> {
        self.matches.iter().filter(move |m| m.entry.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Findings & report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Allergen id (allergy), rule id (interaction), or advisory id.
    pub entry_id: String,
    /// The user allergy id that triggered an allergy finding, or the
    /// medication id of an interaction finding.
    pub related_id: Option<String>,
    pub severity: Severity,
    /// Raw label text of the ingredient that triggered the finding.
    pub matched_ingredient: String,
    pub confidence: f64,
    /// Patient-facing reason.
    pub explanation: String,
    /// Timing guidance carried by an interaction rule.
    pub advice: Option<String>,
    #[serde(default)]
    pub precautionary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanStatus {
    Analyzed,
    /// No ingredient list was available; nothing was checked.
    NotAnalyzed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub scan_id: Uuid,
    pub generated_at: NaiveDateTime,
    pub status: ScanStatus,
    /// Sorted by severity desc, then confidence desc, then insertion order
    /// (allergy findings before interaction findings).
    pub findings: Vec<Finding>,
    pub overall_severity: RiskLevel,
    /// Label text of ingredients that matched nothing, in label order.
    pub unresolved_tokens: Vec<String>,
    pub recommendations: Vec<String>,
    pub knowledge_version: KnowledgeVersion,
}

impl RiskReport {
    pub fn is_safe(&self) -> bool {
        self.overall_severity == RiskLevel::Safe
    }

    pub fn is_analyzed(&self) -> bool {
        self.status == ScanStatus::Analyzed
    }

    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(matches: Vec<IngredientMatch>) -> NormalizedIngredient {
        NormalizedIngredient {
            raw_text: "lecithin".into(),
            span: 0..8,
            canonical_token: "lecithin".into(),
            confidence: if matches.is_empty() { 0.0 } else { 1.0 },
            matches,
            precautionary: false,
        }
    }

    #[test]
    fn matched_entry_id_skips_ambiguous() {
        let ambiguous = token(vec![
            IngredientMatch {
                entry: EntryRef::allergen("egg"),
                confidence: 0.5,
                method: MatchMethod::Exact,
                ambiguous: true,
            },
            IngredientMatch {
                entry: EntryRef::allergen("soy"),
                confidence: 0.5,
                method: MatchMethod::Exact,
                ambiguous: true,
            },
        ]);
        assert!(ambiguous.is_resolved());
        assert_eq!(ambiguous.matched_entry_id(), None);
        assert_eq!(ambiguous.matches_of(EntryKind::Allergen).count(), 2);
    }

    #[test]
    fn unresolved_token_has_no_id() {
        let t = token(vec![]);
        assert!(!t.is_resolved());
        assert_eq!(t.matched_entry_id(), None);
    }

    #[test]
    fn ingredient_source_serde_shape() {
        let json = serde_json::to_value(IngredientSource::unavailable("no barcode")).unwrap();
        assert_eq!(json["unavailable"]["reason"], "no barcode");
        let text: IngredientSource = serde_json::from_str(r#"{ "text": "milk" }"#).unwrap();
        assert_eq!(text, IngredientSource::text("milk"));
    }
}
