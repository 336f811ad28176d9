//! Engine configuration.
//!
//! Loaded from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "facility_aliases": { "fleury medicina": "Fleury" },
//!   "severity_terms": { "muito elevado": "critical" },
//!   "use_default_aliases": true
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Status;
use crate::resolver::{FacilityNameNormalizer, SeverityVocabulary};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tables that tune normalization and categorical severity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Extra facility variants → canonical name (override built-ins)
    pub facility_aliases: BTreeMap<String, String>,
    /// Extra band names → status (override built-ins)
    pub severity_terms: BTreeMap<String, Status>,
    /// Start from the built-in alias table
    pub use_default_aliases: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            facility_aliases: BTreeMap::new(),
            severity_terms: BTreeMap::new(),
            use_default_aliases: true,
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the facility normalizer described by this config.
    pub fn normalizer(&self) -> FacilityNameNormalizer {
        let mut normalizer = if self.use_default_aliases {
            FacilityNameNormalizer::new()
        } else {
            FacilityNameNormalizer::empty()
        };
        for (variant, canonical) in &self.facility_aliases {
            normalizer.add_alias(variant, canonical);
        }
        normalizer
    }

    /// Build the severity vocabulary described by this config.
    pub fn vocabulary(&self) -> SeverityVocabulary {
        let mut vocabulary = SeverityVocabulary::new();
        for (term, status) in &self.severity_terms {
            vocabulary.add_term(term, *status);
        }
        vocabulary
    }
}
