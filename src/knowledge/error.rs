use serde::Serialize;
use thiserror::Error;

use crate::models::{EntryKind, EntryRef};

/// Malformed or inconsistent knowledge base. Fatal to startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Knowledge source read failed ({file}): {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Knowledge source parse failed ({file}): {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} entry {id:?} has an empty {field}")]
    EmptyField {
        kind: EntryKind,
        id: String,
        field: &'static str,
    },

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: EntryKind, id: String },

    #[error("Substance id {0} collides with an allergen id")]
    IdCollision(String),

    #[error("Allergen {id} references unknown category {category}")]
    UnknownCategory { id: String, category: String },

    #[error("Allergen category cycle through {0}")]
    CategoryCycle(String),

    #[error("Medication {id} references unknown class {class}")]
    UnknownClass { id: String, class: String },

    #[error("Medication class cycle through {0}")]
    ClassCycle(String),

    #[error("Allergen {id} lists unknown cross-reactive allergen {target}")]
    UnknownCrossReactive { id: String, target: String },

    #[error("Duplicate interaction rule id: {0}")]
    DuplicateRule(String),

    #[error("Interaction rule {rule} references unknown medication {medication}")]
    UnknownMedication { rule: String, medication: String },

    #[error("Interaction rule {rule} references unknown ingredient {ingredient}")]
    UnknownTrigger { rule: String, ingredient: String },

    #[error("Interaction rule {0} has no triggering ingredients")]
    EmptyTriggers(String),
}

/// A synonym key owned by more than one entry of the same kind.
/// Recorded at load time; matching treats every candidate as a
/// reduced-confidence hit instead of picking one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousSynonym {
    pub key: String,
    pub candidates: Vec<EntryRef>,
}
