//! Ingredient scan pipeline: normalize label text, match allergens and
//! medication interactions, aggregate into a risk report.

pub mod aggregator;
pub mod allergen;
pub mod engine;
mod helpers;
pub mod interaction;
pub mod messages;
pub mod normalizer;
pub mod types;

pub use aggregator::aggregate;
pub use allergen::AllergenMatcher;
pub use engine::ScanEngine;
pub use interaction::InteractionChecker;
pub use messages::MessageTemplates;
pub use normalizer::Normalizer;
pub use types::{
    Finding, IngredientMatch, IngredientSource, NormalizedIngredient, RiskReport, ScanStatus,
    Scanner, NO_ANALYSIS_ADVISORY_ID, UNRESOLVED_ADVISORY_ID,
};
