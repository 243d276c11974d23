use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "allergen-scan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the knowledge base directory.
pub const KB_DIR_ENV: &str = "ALLERGEN_SCAN_KB_DIR";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    "allergen_scan=info,warn".to_string()
}

/// Get the knowledge base directory.
/// `$ALLERGEN_SCAN_KB_DIR` if set, else `<data dir>/allergen-scan/knowledge`.
/// Returns None when neither is available (the bundled data set is used then).
pub fn knowledge_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(KB_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::data_dir().map(|d| d.join(APP_NAME).join("knowledge"))
}

// ═══════════════════════════════════════════════════════════
// Matching thresholds
// ═══════════════════════════════════════════════════════════

/// Tunable matching thresholds for the ingredient normalizer.
///
/// Defaults:
/// - exact synonym hit: 1.0
/// - hit after stripping plurals / descriptor suffixes: 0.85
/// - edit-distance hit: `1 - distance/len`, floored at 0.5
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub exact_confidence: f64,
    pub suffix_confidence: f64,
    pub fuzzy_floor: f64,
    /// Multiplier applied to every candidate of an ambiguous synonym.
    pub ambiguity_penalty: f64,
    /// Tokens at least this many chars long get `max_distance_long`.
    pub long_token_len: usize,
    pub max_distance_long: usize,
    pub max_distance_short: usize,
    /// Tokens shorter than this (in chars, after cleaning) are dropped as noise.
    pub min_token_len: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exact_confidence: 1.0,
            suffix_confidence: 0.85,
            fuzzy_floor: 0.5,
            ambiguity_penalty: 0.5,
            long_token_len: 5,
            max_distance_long: 2,
            max_distance_short: 1,
            min_token_len: 2,
        }
    }
}

impl ScanConfig {
    /// Load thresholds from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        let config: ScanConfig = serde_json::from_str(&json)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("exact_confidence", self.exact_confidence),
            ("suffix_confidence", self.suffix_confidence),
            ("fuzzy_floor", self.fuzzy_floor),
            ("ambiguity_penalty", self.ambiguity_penalty),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange(field.into(), value));
            }
        }
        Ok(())
    }

    /// Maximum accepted edit distance for a token of `len` chars.
    pub fn max_distance(&self, len: usize) -> usize {
        if len >= self.long_token_len {
            self.max_distance_long
        } else {
            self.max_distance_short
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Scan config read failed ({0}): {1}")]
    Read(String, String),

    #[error("Scan config parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Scan config field {0} must be within 0.0..=1.0, got {1}")]
    OutOfRange(String, f64),
}
