use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A node in the allergen taxonomy ("casein" under "milk").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergenEntry {
    pub id: String,
    pub canonical_name: String,
    /// Parent allergen id. The category graph must be a forest.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
    /// Allergen families that commonly cross-react or share production lines.
    #[serde(default)]
    pub cross_reactive: BTreeSet<String>,
}

/// A non-allergenic substance that takes part in interaction rules
/// (vitamin K, grapefruit, alcohol).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceEntry {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
}
