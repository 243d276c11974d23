use serde::{Deserialize, Serialize};

use super::enums::EntryKind;

/// Typed reference to a knowledge base entry. Ids are unique per kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryRef {
    pub kind: EntryKind,
    pub id: String,
}

impl EntryRef {
    pub fn new(kind: EntryKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn allergen(id: impl Into<String>) -> Self {
        Self::new(EntryKind::Allergen, id)
    }

    pub fn medication(id: impl Into<String>) -> Self {
        Self::new(EntryKind::Medication, id)
    }

    pub fn substance(id: impl Into<String>) -> Self {
        Self::new(EntryKind::Substance, id)
    }
}

impl std::fmt::Display for EntryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
