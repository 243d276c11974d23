use std::collections::{BTreeSet, HashMap};

use crate::knowledge::KnowledgeBase;
use crate::models::{EntryKind, EntryRef, FindingKind, Severity};

use super::helpers::upsert_strongest;
use super::messages::MessageTemplates;
use super::types::{Finding, IngredientMatch, NormalizedIngredient};

/// How a matched allergen relates to the user's allergy list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// The allergen itself is listed.
    Direct,
    /// A category above it is listed (casein under milk).
    Category,
    /// A related but distinct allergen is listed (peanut and tree nuts).
    CrossReactive,
}

impl Relation {
    /// Cross-reactivity is reported apart from allergens actually detected.
    fn kind(self) -> FindingKind {
        match self {
            Self::Direct | Self::Category => FindingKind::Allergy,
            Self::CrossReactive => FindingKind::CrossReactive,
        }
    }

    fn severity(self) -> Severity {
        match self {
            Self::Direct => Severity::Severe,
            Self::Category => Severity::Warning,
            Self::CrossReactive => Severity::Info,
        }
    }
}

struct AllergyHit<'a> {
    relation: Relation,
    /// The user allergy id this hit is reported against.
    allergy_id: &'a str,
}

/// Matches normalized tokens against the user's declared allergies.
pub struct AllergenMatcher<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> AllergenMatcher<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// One finding per allergen id, in first-seen order. Repeat hits keep the
    /// strongest (severity, then confidence).
    pub fn find(
        &self,
        tokens: &[NormalizedIngredient],
        allergy_ids: &BTreeSet<String>,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        if allergy_ids.is_empty() {
            return findings;
        }

        let mut positions: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            for candidate in token.matches_of(EntryKind::Allergen) {
                let Some(hit) = self.classify(&candidate.entry.id, allergy_ids) else {
                    continue;
                };
                let finding = self.finding(token, candidate, &hit);
                upsert_strongest(&mut findings, &mut positions, candidate.entry.id.clone(), finding);
            }
        }
        findings
    }

    /// Direct hit first, then the nearest listed ancestor category, then a
    /// cross-reactivity link from the allergen or any of its ancestors.
    fn classify<'s>(
        &self,
        allergen_id: &str,
        allergy_ids: &'s BTreeSet<String>,
    ) -> Option<AllergyHit<'s>> {
        if let Some(id) = allergy_ids.get(allergen_id) {
            return Some(AllergyHit {
                relation: Relation::Direct,
                allergy_id: id,
            });
        }

        let ancestors = self.knowledge.category_ancestors(allergen_id);
        if let Some(id) = ancestors.iter().skip(1).find_map(|a| allergy_ids.get(a)) {
            return Some(AllergyHit {
                relation: Relation::Category,
                allergy_id: id,
            });
        }

        ancestors.iter().find_map(|ancestor| {
            allergy_ids
                .iter()
                .find(|user_id| self.cross_reactive(ancestor, user_id))
                .map(|id| AllergyHit {
                    relation: Relation::CrossReactive,
                    allergy_id: id,
                })
        })
    }

    /// Cross-reactivity links are symmetric: either entry may declare it.
    fn cross_reactive(&self, a: &str, b: &str) -> bool {
        let declares = |from: &str, to: &str| {
            self.knowledge
                .allergen(from)
                .is_some_and(|entry| entry.cross_reactive.contains(to))
        };
        declares(a, b) || declares(b, a)
    }

    fn finding(
        &self,
        token: &NormalizedIngredient,
        candidate: &IngredientMatch,
        hit: &AllergyHit<'_>,
    ) -> Finding {
        let allergen = self.knowledge.display_name(&candidate.entry);
        let listed = EntryRef::allergen(hit.allergy_id);
        let listed_name = self.knowledge.display_name(&listed);

        let mut explanation = match hit.relation {
            Relation::Direct => MessageTemplates::allergy_direct(&token.raw_text, allergen),
            Relation::Category => {
                MessageTemplates::allergy_category(&token.raw_text, allergen, listed_name)
            }
            Relation::CrossReactive => {
                MessageTemplates::allergy_cross_reactive(&token.raw_text, allergen, listed_name)
            }
        };

        let mut severity = hit.relation.severity();
        if token.precautionary {
            severity = severity.min(Severity::Caution);
            explanation = MessageTemplates::precautionary(&explanation);
        }

        Finding {
            kind: hit.relation.kind(),
            entry_id: candidate.entry.id.clone(),
            related_id: Some(hit.allergy_id.to_string()),
            severity,
            matched_ingredient: token.raw_text.clone(),
            confidence: candidate.confidence,
            explanation,
            advice: None,
            precautionary: token.precautionary,
        }
    }
}
