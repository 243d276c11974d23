use crate::models::{FindingKind, RiskLevel};

use super::types::Finding;

/// Patient-facing wording for findings and recommendations.
/// Calm, factual framing. No alarm wording.
pub struct MessageTemplates;

impl MessageTemplates {
    /// Ingredient is one of the user's allergens.
    pub fn allergy_direct(ingredient: &str, allergen: &str) -> String {
        format!(
            "This product lists {}, which is {}. \
             Your profile notes an allergy to {}.",
            ingredient, allergen, allergen,
        )
    }

    /// Ingredient belongs to a category the user is allergic to.
    pub fn allergy_category(ingredient: &str, allergen: &str, category: &str) -> String {
        format!(
            "This product lists {} ({}), which comes from {}. \
             Your profile notes an allergy to {}.",
            ingredient, allergen, category, category,
        )
    }

    /// Ingredient is related to, but not the same as, a user allergen.
    pub fn allergy_cross_reactive(ingredient: &str, allergen: &str, related: &str) -> String {
        format!(
            "This product lists {} ({}). Some people allergic to {} also react to it. \
             You may want to check with your allergist.",
            ingredient, allergen, related,
        )
    }

    /// Prefix for findings that come from a "may contain" statement.
    pub fn precautionary(message: &str) -> String {
        format!(
            "The label carries a precautionary statement (\"may contain\"). {}",
            message,
        )
    }

    /// Ingredients that could not be matched for a non-empty profile.
    pub fn unresolved(tokens: &[String]) -> String {
        format!(
            "Some ingredients could not be checked against your profile: {}. \
             Please read these on the label yourself.",
            tokens.join(", "),
        )
    }

    /// No ingredient list was available at all.
    pub fn not_analyzed(reason: &str) -> String {
        format!(
            "No ingredient list was available ({}), so this product was not checked. \
             This does not mean it is safe for you.",
            reason,
        )
    }

    /// Report-level recommendations, most important first.
    pub fn recommendations(level: RiskLevel, findings: &[Finding]) -> Vec<String> {
        let mut lines = Vec::new();
        match level {
            RiskLevel::Severe => {
                lines.push(
                    "This product contains something your profile flags as a serious concern. \
                     It is best to avoid it."
                        .to_string(),
                );
                lines.push(
                    "If you have already had some and feel unwell, contact your doctor \
                     or local emergency services."
                        .to_string(),
                );
            }
            RiskLevel::Warning => lines.push(
                "This product may not be suitable for you. \
                 Check with your doctor or pharmacist before having it."
                    .to_string(),
            ),
            RiskLevel::Caution => lines.push(
                "Some details need a closer look. \
                 Read the label carefully before having this product."
                    .to_string(),
            ),
            RiskLevel::Info => lines.push(
                "Nothing in your profile is directly affected. The notes below are for reference."
                    .to_string(),
            ),
            RiskLevel::Safe => {
                lines.push("No known allergens or interactions were found for your profile.".to_string());
                lines.push("Recipes change, so it is worth checking the label on each purchase.".to_string());
            }
        }

        if findings.iter().any(|f| f.precautionary) {
            lines.push(
                "\"May contain\" statements mean cross-contact is possible. \
                 How much risk that carries depends on your allergy."
                    .to_string(),
            );
        }

        if findings.iter().any(|f| f.kind == FindingKind::CrossReactive) {
            lines.push(
                "Related allergens are noted for reference. Many people react to only one \
                 of them, so ask your allergist if you are unsure."
                    .to_string(),
            );
        }

        for finding in findings.iter().filter(|f| f.kind == FindingKind::MedicationInteraction) {
            if let Some(advice) = &finding.advice {
                if !lines.contains(advice) {
                    lines.push(advice.clone());
                }
            }
        }

        lines.push(Self::disclaimer().to_string());
        lines
    }

    pub fn not_analyzed_recommendations() -> Vec<String> {
        vec![
            "Read the printed ingredient list, or enter it manually and scan again.".to_string(),
            Self::disclaimer().to_string(),
        ]
    }

    pub fn disclaimer() -> &'static str {
        "This check is informational and does not replace advice from your doctor or pharmacist."
    }
}
