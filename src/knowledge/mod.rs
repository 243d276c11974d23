//! Knowledge Base Store: versioned allergen, medication, substance and
//! interaction-rule data with a case-insensitive synonym index.

pub mod error;
pub mod keys;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{AmbiguousSynonym, LoadError};
pub use keys::normalize_key;
pub use source::{
    AllergenSource, InteractionSource, KnowledgeSources, KnowledgeVersion, MedicationSource,
};
pub use store::{KnowledgeBase, ProfileResolution};
