use std::collections::{BTreeSet, HashMap};

use crate::knowledge::KnowledgeBase;
use crate::models::{FindingKind, InteractionRule, Severity};

use super::helpers::upsert_strongest;
use super::messages::MessageTemplates;
use super::types::{Finding, IngredientMatch, NormalizedIngredient};

/// Checks normalized tokens against the interaction rules of the user's
/// medications. Only direct ingredient ids trigger a rule; allergen
/// categories are not expanded here. Medication classes are: a rule on
/// "blood_thinner" applies to warfarin and apixaban alike.
pub struct InteractionChecker<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> InteractionChecker<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// One finding per triggered rule, ordered by medication id, then the
    /// medication's own rules before its class rules, then source order.
    /// A class rule reached through two of the user's medications is
    /// reported once.
    pub fn find(
        &self,
        tokens: &[NormalizedIngredient],
        medication_ids: &BTreeSet<String>,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for medication_id in medication_ids {
            for rule in self.knowledge.applicable_rules(medication_id) {
                if let Some((token, candidate)) = strongest_trigger(rule, tokens) {
                    let finding = self.finding(rule, medication_id, token, candidate);
                    upsert_strongest(&mut findings, &mut positions, rule.id.as_str(), finding);
                }
            }
        }
        findings
    }

    fn finding(
        &self,
        rule: &InteractionRule,
        medication_id: &str,
        token: &NormalizedIngredient,
        candidate: &IngredientMatch,
    ) -> Finding {
        let (severity, explanation) = if token.precautionary {
            (
                rule.severity.min(Severity::Caution),
                MessageTemplates::precautionary(&rule.description),
            )
        } else {
            (rule.severity, rule.description.clone())
        };

        tracing::debug!(
            rule = %rule.id,
            medication = %medication_id,
            ingredient = %candidate.entry,
            confidence = candidate.confidence,
            "Interaction rule triggered"
        );

        Finding {
            kind: FindingKind::MedicationInteraction,
            entry_id: rule.id.clone(),
            related_id: Some(medication_id.to_string()),
            severity,
            matched_ingredient: token.raw_text.clone(),
            confidence: candidate.confidence,
            explanation,
            advice: rule.timing.clone(),
            precautionary: token.precautionary,
        }
    }
}

/// The token that best triggers `rule`: listed ingredients beat "may
/// contain" ones, then higher confidence wins, then the earliest token.
fn strongest_trigger<'t>(
    rule: &InteractionRule,
    tokens: &'t [NormalizedIngredient],
) -> Option<(&'t NormalizedIngredient, &'t IngredientMatch)> {
    let mut best: Option<(&NormalizedIngredient, &IngredientMatch)> = None;
    for token in tokens {
        let triggers = token.matches.iter().filter(|m| {
            m.entry.kind.is_ingredient() && rule.triggering_ingredient_ids.contains(&m.entry.id)
        });
        for candidate in triggers {
            let stronger = match best {
                None => true,
                Some((best_token, best_match)) => (!token.precautionary)
                    .cmp(&!best_token.precautionary)
                    .then(candidate.confidence.total_cmp(&best_match.confidence))
                    .is_gt(),
            };
            if stronger {
                best = Some((token, candidate));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::knowledge::fixtures::load_test;
    use crate::scan::normalizer::Normalizer;

    fn meds(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn run(text: &str, ids: &[&str]) -> Vec<Finding> {
        let kb = load_test();
        let config = ScanConfig::default();
        let tokens = Normalizer::new(&kb, &config).normalize(text);
        InteractionChecker::new(&kb).find(&tokens, &meds(ids))
    }

    #[test]
    fn substance_triggers_rule() {
        let findings = run("spinach, phylloquinone", &["warfarin"]);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.kind, FindingKind::MedicationInteraction);
        assert_eq!(f.entry_id, "warfarin_vitamin_k");
        assert_eq!(f.related_id.as_deref(), Some("warfarin"));
        assert_eq!(f.severity, Severity::Severe);
        assert_eq!(f.explanation, "Vitamin K counteracts the anticoagulant effect of warfarin.");
        assert_eq!(f.advice, None);
    }

    #[test]
    fn two_rules_same_medication_are_separate() {
        let findings = run("vitamin k1, wine", &["warfarin"]);
        let ids: Vec<&str> = findings.iter().map(|f| f.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["warfarin_vitamin_k", "warfarin_alcohol"]);
    }

    #[test]
    fn allergen_id_can_trigger_rule_with_timing() {
        let findings = run("soy flour", &["levothyroxine"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(
            findings[0].advice.as_deref(),
            Some("Take levothyroxine 30-60 minutes before eating.")
        );
    }

    #[test]
    fn one_finding_per_rule_with_best_confidence() {
        let findings = run("ethanoll, beer", &["warfarin"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].matched_ingredient, "beer");
        assert_eq!(findings[0].confidence, 1.0);
    }

    #[test]
    fn medication_token_does_not_trigger() {
        // "aspirin" is also a medication synonym; only the substance side counts
        let kb = load_test();
        assert!(kb.rules_for_medication("aspirin").next().is_none());
        assert!(run("aspirin", &["warfarin"]).is_empty());
    }

    #[test]
    fn class_rule_fires_for_member() {
        let findings = run("cranberry juice, sugar", &["apixaban"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].entry_id, "blood_thinner_cranberry");
        assert_eq!(findings[0].related_id.as_deref(), Some("apixaban"));
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn class_rule_reported_once_for_two_members() {
        let findings = run("cranberry, wine", &["apixaban", "warfarin"]);
        let ids: Vec<&str> = findings.iter().map(|f| f.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["blood_thinner_cranberry", "warfarin_alcohol"]);
        assert_eq!(findings[0].related_id.as_deref(), Some("apixaban"));
    }

    #[test]
    fn class_listed_directly_gets_class_rules() {
        let findings = run("cranberry", &["blood_thinner"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].related_id.as_deref(), Some("blood_thinner"));
    }

    #[test]
    fn no_medications_no_findings() {
        assert!(run("grapefruit juice", &[]).is_empty());
    }
}
