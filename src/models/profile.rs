use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Snapshot of a user's sensitivities. Owned by the profile layer; the engine
/// only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub allergy_ids: BTreeSet<String>,
    #[serde(default)]
    pub medication_ids: BTreeSet<String>,
}

impl UserProfile {
    pub fn new<A, M>(allergy_ids: A, medication_ids: M) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            allergy_ids: allergy_ids.into_iter().map(Into::into).collect(),
            medication_ids: medication_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// A profile with nothing to check against.
    pub fn is_trivial(&self) -> bool {
        self.allergy_ids.is_empty() && self.medication_ids.is_empty()
    }
}
