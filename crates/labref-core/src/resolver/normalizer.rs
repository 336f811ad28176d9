//! Laboratory name normalizer.
//!
//! Handles:
//! - Whitespace trimming and collapsing
//! - Case and accent folding for lookups (LABMAX, Lab Max, labmax)
//! - Alias expansion to a canonical display name (lab max → LabMax)
//!
//! Only exact phrase matches on the folded key are recognized. Unknown names are
//! returned trimmed, untouched otherwise.

use std::collections::HashMap;

/// Normalizer for free-text laboratory names.
#[derive(Debug, Clone)]
pub struct FacilityNameNormalizer {
    /// Alias map: folded variant → canonical display name
    aliases: HashMap<String, String>,
}

impl Default for FacilityNameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FacilityNameNormalizer {
    /// Create a normalizer with the built-in alias table.
    pub fn new() -> Self {
        Self::with_aliases(Self::default_aliases())
    }

    /// Create a normalizer with no aliases (pure trimming).
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    /// Create a normalizer from an injected alias table.
    pub fn with_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let aliases = aliases
            .into_iter()
            .map(|(variant, canonical)| (fold_key(variant.as_ref()), canonical.into()))
            .collect();
        Self { aliases }
    }

    /// Canonicalize a laboratory name.
    pub fn normalize(&self, raw_name: &str) -> String {
        let trimmed = raw_name.trim();
        self.aliases
            .get(&fold_key(trimmed))
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Identity key for a (normalized) name, used for find-or-create lookups.
    pub fn identity_key(&self, name: &str) -> String {
        fold_key(&self.normalize(name))
    }

    /// Add a custom alias mapping.
    pub fn add_alias(&mut self, variant: &str, canonical: &str) {
        self.aliases.insert(fold_key(variant), canonical.to_string());
    }

    /// Number of known variants.
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Default laboratory alias mappings.
    pub fn default_aliases() -> Vec<(&'static str, &'static str)> {
        vec![
            ("labmax", "LabMax"),
            ("lab max", "LabMax"),
            ("bioprev", "Bioprev"),
            ("bio prev", "Bioprev"),
            ("laboratório são miguel", "Laboratório São Miguel"),
            ("lab são miguel", "Laboratório São Miguel"),
            ("são miguel", "Laboratório São Miguel"),
            ("laboratório pronto análise", "Laboratório Pronto Análise"),
            ("pronto análise", "Laboratório Pronto Análise"),
            ("laboratório desconhecido", "Laboratório Desconhecido"),
        ]
    }
}

/// Fold text into a lookup key: lowercase, strip Latin diacritics, collapse whitespace.
pub fn fold_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !key.is_empty() {
            key.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            key.push(strip_diacritic(c));
        }
    }
    key
}

fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}
