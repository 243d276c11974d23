use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ScanConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::UserProfile;

use super::aggregator::{aggregate, not_analyzed};
use super::allergen::AllergenMatcher;
use super::interaction::InteractionChecker;
use super::normalizer::Normalizer;
use super::types::{IngredientSource, NormalizedIngredient, RiskReport, Scanner};

/// Default scanner: normalizer, allergen matcher and interaction checker over
/// one shared, read-only knowledge base. Cheap to clone across threads.
#[derive(Debug, Clone)]
pub struct ScanEngine {
    knowledge: Arc<KnowledgeBase>,
    config: ScanConfig,
}

impl ScanEngine {
    pub fn new(knowledge: Arc<KnowledgeBase>, config: ScanConfig) -> Self {
        Self { knowledge, config }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Tokenize and resolve ingredient text without scoring it.
    pub fn normalize(&self, text: &str) -> Vec<NormalizedIngredient> {
        Normalizer::new(&self.knowledge, &self.config).normalize(text)
    }

    fn analyze(&self, text: &str, profile: &UserProfile) -> (RiskReport, usize) {
        let tokens = self.normalize(text);
        let allergy_findings =
            AllergenMatcher::new(&self.knowledge).find(&tokens, &profile.allergy_ids);
        let interaction_findings =
            InteractionChecker::new(&self.knowledge).find(&tokens, &profile.medication_ids);

        let report = aggregate(
            allergy_findings,
            interaction_findings,
            unresolved_tokens(&tokens),
            profile,
        );
        (report, tokens.len())
    }
}

impl Scanner for ScanEngine {
    fn scan(&self, source: &IngredientSource, profile: &UserProfile) -> RiskReport {
        let start = Instant::now();

        let unknown = self.knowledge.unknown_profile_ids(profile);
        if !unknown.is_empty() {
            tracing::warn!(ids = ?unknown, "Profile references ids missing from the knowledge base");
        }

        let (mut report, token_count) = match source {
            IngredientSource::Text(text) => self.analyze(text, profile),
            IngredientSource::Unavailable { reason } => {
                tracing::info!(reason = %reason, "Ingredient list unavailable, scan not analyzed");
                (not_analyzed(reason), 0)
            }
        };
        report.knowledge_version = self.knowledge.version().clone();

        let processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            scan_id = %report.scan_id,
            tokens = token_count,
            findings = report.findings.len(),
            unresolved = report.unresolved_tokens.len(),
            overall = report.overall_severity.as_str(),
            processing_ms = processing_time_ms,
            "Scan complete"
        );

        report
    }
}

/// Label text of unresolved tokens, once per canonical token, in label order.
fn unresolved_tokens(tokens: &[NormalizedIngredient]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|t| !t.is_resolved())
        .filter(|t| seen.insert(t.canonical_token.as_str()))
        .map(|t| t.raw_text.clone())
        .collect()
}
