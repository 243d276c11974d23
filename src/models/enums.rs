use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value:?}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Variants are ordered as declared, so `Ord` follows declaration order.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Severity of a single finding: info < caution < warning < severe.
str_enum!(Severity {
    Info => "info",
    Caution => "caution",
    Warning => "warning",
    Severe => "severe",
});

// Overall report level. `Safe` sits below every finding severity.
str_enum!(RiskLevel {
    Safe => "safe",
    Info => "info",
    Caution => "caution",
    Warning => "warning",
    Severe => "severe",
});

str_enum!(EntryKind {
    Allergen => "allergen",
    Medication => "medication",
    Substance => "substance",
});

str_enum!(FindingKind {
    Allergy => "allergy",
    CrossReactive => "cross_reactive",
    MedicationInteraction => "medication_interaction",
    Advisory => "advisory",
});

str_enum!(MatchMethod {
    Exact => "exact",
    Suffix => "suffix",
    Fuzzy => "fuzzy",
});

impl From<Severity> for RiskLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => Self::Info,
            Severity::Caution => Self::Caution,
            Severity::Warning => Self::Warning,
            Severity::Severe => Self::Severe,
        }
    }
}

impl EntryKind {
    /// Allergens and substances share one namespace: both are things found in food.
    pub fn is_ingredient(&self) -> bool {
        matches!(self, Self::Allergen | Self::Substance)
    }
}
