use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::enums::Severity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub id: String,
    pub canonical_name: String,
    /// Parent medication class id ("blood_thinner" above "warfarin").
    /// Rules naming a class apply to every member.
    #[serde(default)]
    pub class: Option<String>,
    /// Brand names and common abbreviations.
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
}

/// A food-medication interaction: taking `medication_id` (or any member of
/// that class) while eating any of `triggering_ingredient_ids` (allergen or
/// substance ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub id: String,
    pub medication_id: String,
    pub triggering_ingredient_ids: BTreeSet<String>,
    pub severity: Severity,
    pub description: String,
    /// Timing guidance, e.g. "take 1 hour before meals".
    #[serde(default)]
    pub timing: Option<String>,
}
