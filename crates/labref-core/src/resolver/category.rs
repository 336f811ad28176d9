//! Categorical band matching and severity mapping.
//!
//! Matching is two-step: first find the band the value falls in (authored order,
//! first match wins), then map the band's free-text name to a [`Status`] through
//! the [`SeverityVocabulary`]. Band order never implies severity.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::normalizer::fold_key;
use crate::models::{Category, Status};

/// Lookup table from band name to severity.
#[derive(Debug, Clone)]
pub struct SeverityVocabulary {
    /// Folded band name → status
    terms: HashMap<String, Status>,
}

impl Default for SeverityVocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl SeverityVocabulary {
    /// Create a vocabulary with the built-in terms.
    pub fn new() -> Self {
        let mut vocabulary = Self::empty();
        for (term, status) in Self::default_terms() {
            vocabulary.add_term(term, status);
        }
        vocabulary
    }

    pub fn empty() -> Self {
        Self {
            terms: HashMap::new(),
        }
    }

    /// Add or override a term.
    pub fn add_term(&mut self, term: &str, status: Status) {
        self.terms.insert(fold_key(term), status);
    }

    /// Severity for a band name; unknown names are `Normal`.
    pub fn severity_of(&self, band_name: &str) -> Status {
        self.lookup(band_name).unwrap_or(Status::Normal)
    }

    /// Severity for a band name, if the name is known.
    pub fn lookup(&self, band_name: &str) -> Option<Status> {
        self.terms.get(&fold_key(band_name)).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Built-in band vocabulary (Portuguese report labels plus English equivalents).
    fn default_terms() -> Vec<(&'static str, Status)> {
        let normal = [
            "normal",
            "desejável",
            "ótimo",
            "bom",
            "adequado",
            "ideal",
            "adequado população geral",
            "desirable",
            "optimal",
            "good",
            "adequate",
        ];
        let high = [
            "alto",
            "elevado",
            "limítrofe",
            "aumentado",
            "muito alto",
            "ideal (grupos de risco)",
            "high",
            "elevated",
            "borderline",
            "borderline high",
            "increased",
            "very high",
        ];
        let low = [
            "baixo",
            "diminuído",
            "inadequado",
            "muito baixo",
            "deficiente",
            "insuficiente",
            "low",
            "decreased",
            "deficient",
            "insufficient",
            "inadequate",
            "very low",
        ];
        let critical = [
            "crítico",
            "risco",
            "perigoso",
            "risco de intoxicação",
            "critical",
            "danger",
            "dangerous",
            "risk",
            "toxic",
        ];

        normal
            .into_iter()
            .map(|t| (t, Status::Normal))
            .chain(high.into_iter().map(|t| (t, Status::High)))
            .chain(low.into_iter().map(|t| (t, Status::Low)))
            .chain(critical.into_iter().map(|t| (t, Status::Critical)))
            .collect()
    }
}

/// Result of classifying a value against categorical bands.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub status: Status,
    /// The band the value fell in, if any
    pub band: Option<Category>,
}

/// Finds the band a value falls in and maps it to a severity.
#[derive(Debug, Clone, Default)]
pub struct CategoryMatcher {
    vocabulary: SeverityVocabulary,
}

impl CategoryMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vocabulary(vocabulary: SeverityVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &SeverityVocabulary {
        &self.vocabulary
    }

    /// Classify a value; no matching band means `Normal`.
    pub fn classify(&self, value: Decimal, categories: &[Category]) -> CategoryMatch {
        match find_band(value, categories) {
            Some(band) => CategoryMatch {
                status: self.vocabulary.severity_of(&band.name),
                band: Some(band.clone()),
            },
            None => CategoryMatch {
                status: Status::Normal,
                band: None,
            },
        }
    }
}

/// First band (in authored order) containing the value.
pub fn find_band(value: Decimal, categories: &[Category]) -> Option<&Category> {
    categories.iter().find(|band| band.contains(value))
}
