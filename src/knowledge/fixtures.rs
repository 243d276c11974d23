//! Small in-memory knowledge base shared by unit tests.

use std::collections::BTreeSet;

use crate::models::{
    AllergenEntry, InteractionRule, MedicationEntry, Severity, SubstanceEntry,
};

use super::source::{AllergenSource, InteractionSource, KnowledgeSources, MedicationSource};
use super::store::KnowledgeBase;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn allergen(id: &str, name: &str, category: Option<&str>, synonyms: &[&str]) -> AllergenEntry {
    AllergenEntry {
        id: id.into(),
        canonical_name: name.into(),
        category: category.map(Into::into),
        synonyms: set(synonyms),
        cross_reactive: BTreeSet::new(),
    }
}

fn substance(id: &str, name: &str, synonyms: &[&str]) -> SubstanceEntry {
    SubstanceEntry {
        id: id.into(),
        canonical_name: name.into(),
        synonyms: set(synonyms),
    }
}

fn medication(id: &str, name: &str, class: Option<&str>, synonyms: &[&str]) -> MedicationEntry {
    MedicationEntry {
        id: id.into(),
        canonical_name: name.into(),
        class: class.map(Into::into),
        synonyms: set(synonyms),
    }
}

fn rule(
    id: &str,
    medication_id: &str,
    triggers: &[&str],
    severity: Severity,
    description: &str,
    timing: Option<&str>,
) -> InteractionRule {
    InteractionRule {
        id: id.into(),
        medication_id: medication_id.into(),
        triggering_ingredient_ids: set(triggers),
        severity,
        description: description.into(),
        timing: timing.map(Into::into),
    }
}

pub(crate) fn test_sources() -> KnowledgeSources {
    let mut peanut = allergen("peanut", "Peanut", None, &["peanuts", "groundnut", "peanut oil", "arachis oil"]);
    peanut.cross_reactive = set(&["tree_nut"]);

    KnowledgeSources {
        allergens: AllergenSource {
            version: "test-allergens-1".into(),
            allergens: vec![
                allergen("milk", "Milk", None, &["dairy", "milk powder", "skim milk"]),
                allergen("casein", "Casein", Some("milk"), &["caseinate", "sodium caseinate"]),
                allergen("whey", "Whey", Some("milk"), &["whey powder"]),
                allergen("egg", "Egg", None, &["eggs", "albumin", "lecithin"]),
                peanut,
                allergen("tree_nut", "Tree nut", None, &["tree nuts"]),
                allergen("cashew", "Cashew", Some("tree_nut"), &["cashews"]),
                allergen("almond", "Almond", Some("tree_nut"), &["almonds"]),
                allergen("soy", "Soy", None, &["soya", "soybean", "soy lecithin", "lecithin"]),
                allergen("wheat", "Wheat", None, &["wheat flour", "semolina"]),
            ],
        },
        medications: MedicationSource {
            version: "test-medications-1".into(),
            medications: vec![
                medication("blood_thinner", "Blood thinners", None, &["anticoagulant"]),
                medication("warfarin", "Warfarin", Some("blood_thinner"), &["coumadin", "jantoven"]),
                medication("apixaban", "Apixaban", Some("blood_thinner"), &["eliquis"]),
                medication("simvastatin", "Simvastatin", None, &["zocor"]),
                medication("levothyroxine", "Levothyroxine", None, &["synthroid"]),
                medication("aspirin", "Aspirin", None, &["acetylsalicylic acid"]),
            ],
        },
        interactions: InteractionSource {
            version: "test-interactions-1".into(),
            substances: vec![
                substance("vitamin_k", "Vitamin K", &["phylloquinone", "vitamin k1"]),
                substance("alcohol", "Alcohol", &["ethanol", "wine", "beer"]),
                substance("grapefruit", "Grapefruit", &["grapefruit juice"]),
                substance("salicylate", "Salicylate", &["aspirin"]),
                substance("cranberry", "Cranberry", &["cranberry juice"]),
            ],
            rules: vec![
                rule(
                    "warfarin_vitamin_k",
                    "warfarin",
                    &["vitamin_k"],
                    Severity::Severe,
                    "Vitamin K counteracts the anticoagulant effect of warfarin.",
                    None,
                ),
                rule(
                    "warfarin_alcohol",
                    "warfarin",
                    &["alcohol"],
                    Severity::Caution,
                    "Alcohol can change how warfarin is metabolised.",
                    None,
                ),
                rule(
                    "blood_thinner_cranberry",
                    "blood_thinner",
                    &["cranberry"],
                    Severity::Warning,
                    "Cranberry can strengthen the effect of blood thinners.",
                    None,
                ),
                rule(
                    "simvastatin_grapefruit",
                    "simvastatin",
                    &["grapefruit"],
                    Severity::Severe,
                    "Grapefruit raises simvastatin blood levels.",
                    None,
                ),
                rule(
                    "levothyroxine_soy",
                    "levothyroxine",
                    &["soy"],
                    Severity::Warning,
                    "Soy can reduce levothyroxine absorption.",
                    Some("Take levothyroxine 30-60 minutes before eating."),
                ),
            ],
        },
    }
}

/// Build the test knowledge base (no file I/O).
pub(crate) fn load_test() -> KnowledgeBase {
    KnowledgeBase::from_sources(test_sources()).unwrap()
}
