pub mod allergy;
pub mod entry;
pub mod enums;
pub mod medication;
pub mod profile;

pub use allergy::{AllergenEntry, SubstanceEntry};
pub use entry::EntryRef;
pub use enums::{EntryKind, FindingKind, InvalidEnum, MatchMethod, RiskLevel, Severity};
pub use medication::{InteractionRule, MedicationEntry};
pub use profile::UserProfile;
