//! Knowledge source documents and the bundled default data set.
//!
//! Three independently versioned JSON documents:
//!
//! - `allergens.json`: `{ "version": "...", "allergens": [AllergenEntry] }`
//! - `medications.json`: `{ "version": "...", "medications": [MedicationEntry] }`
//! - `interactions.json`:
//!   `{ "version": "...", "substances": [SubstanceEntry], "rules": [InteractionRule] }`

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{AllergenEntry, InteractionRule, MedicationEntry, SubstanceEntry};

use super::error::LoadError;

pub const ALLERGENS_FILE: &str = "allergens.json";
pub const MEDICATIONS_FILE: &str = "medications.json";
pub const INTERACTIONS_FILE: &str = "interactions.json";

const BUNDLED_ALLERGENS: &str = include_str!("../../resources/allergens.json");
const BUNDLED_MEDICATIONS: &str = include_str!("../../resources/medications.json");
const BUNDLED_INTERACTIONS: &str = include_str!("../../resources/interactions.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllergenSource {
    #[serde(default)]
    pub version: String,
    pub allergens: Vec<AllergenEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationSource {
    #[serde(default)]
    pub version: String,
    pub medications: Vec<MedicationEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionSource {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub substances: Vec<SubstanceEntry>,
    pub rules: Vec<InteractionRule>,
}

/// Versions of the three sources a knowledge base was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeVersion {
    pub allergens: String,
    pub medications: String,
    pub interactions: String,
}

/// The three parsed documents, ready for `KnowledgeBase::load`.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeSources {
    pub allergens: AllergenSource,
    pub medications: MedicationSource,
    pub interactions: InteractionSource,
}

impl KnowledgeSources {
    /// Parse three JSON documents. Errors name the canonical source file.
    pub fn from_json(
        allergens_json: &str,
        medications_json: &str,
        interactions_json: &str,
    ) -> Result<Self, LoadError> {
        Ok(Self {
            allergens: parse(ALLERGENS_FILE, allergens_json)?,
            medications: parse(MEDICATIONS_FILE, medications_json)?,
            interactions: parse(INTERACTIONS_FILE, interactions_json)?,
        })
    }

    /// Read the three documents from a directory.
    pub fn read_dir(dir: &Path) -> Result<Self, LoadError> {
        let allergens = read(dir, ALLERGENS_FILE)?;
        let medications = read(dir, MEDICATIONS_FILE)?;
        let interactions = read(dir, INTERACTIONS_FILE)?;
        Self::from_json(&allergens, &medications, &interactions)
    }

    /// The data set compiled into the binary.
    pub fn bundled() -> Result<Self, LoadError> {
        Self::from_json(BUNDLED_ALLERGENS, BUNDLED_MEDICATIONS, BUNDLED_INTERACTIONS)
    }
}

fn read(dir: &Path, file: &str) -> Result<String, LoadError> {
    let path = dir.join(file);
    std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        file: path.display().to_string(),
        source,
    })
}

fn parse<T: DeserializeOwned>(file: &str, json: &str) -> Result<T, LoadError> {
    serde_json::from_str(json).map_err(|source| LoadError::Parse {
        file: file.to_string(),
        source,
    })
}
