//! Reference range models.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Gender constraint on a reference range.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RangeGender {
    Male,
    Female,
    /// Wildcard - applies to every patient
    #[default]
    Both,
}

impl RangeGender {
    /// Parse a gender label (case-insensitive).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for RangeGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a reference definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    Numeric,
    Categorical,
}

impl ReferenceType {
    /// Parse a reference type label (case-insensitive).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "numeric" => Some(Self::Numeric),
            "categorical" => Some(Self::Categorical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named band of a categorical reference (e.g. "Desejável" up to 200).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub min: Option<Decimal>,
    #[serde(default)]
    pub max: Option<Decimal>,
}

impl Category {
    pub fn new(name: impl Into<String>, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    /// Inclusive band check; an absent bound is unbounded on that side.
    pub fn contains(&self, value: Decimal) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// The reference definition itself: either a min/max pair or ordered bands.
///
/// Serialized with a `reference_type` tag. A missing or null tag reads as numeric.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "reference_type", rename_all = "lowercase")]
pub enum ReferenceKind {
    Numeric {
        #[serde(default)]
        reference_min: Option<Decimal>,
        #[serde(default)]
        reference_max: Option<Decimal>,
    },
    Categorical {
        reference_categories: Vec<Category>,
    },
}

#[derive(Deserialize)]
struct ReferenceKindFields {
    #[serde(default)]
    reference_type: Option<ReferenceType>,
    #[serde(default)]
    reference_min: Option<Decimal>,
    #[serde(default)]
    reference_max: Option<Decimal>,
    #[serde(default)]
    reference_categories: Option<Vec<Category>>,
}

impl<'de> Deserialize<'de> for ReferenceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = ReferenceKindFields::deserialize(deserializer)?;
        Ok(match fields.reference_type.unwrap_or(ReferenceType::Numeric) {
            ReferenceType::Numeric => Self::Numeric {
                reference_min: fields.reference_min,
                reference_max: fields.reference_max,
            },
            ReferenceType::Categorical => Self::Categorical {
                reference_categories: fields.reference_categories.unwrap_or_default(),
            },
        })
    }
}

impl ReferenceKind {
    pub fn reference_type(&self) -> ReferenceType {
        match self {
            Self::Numeric { .. } => ReferenceType::Numeric,
            Self::Categorical { .. } => ReferenceType::Categorical,
        }
    }

    /// Categories in authored order, if categorical.
    pub fn categories(&self) -> Option<&[Category]> {
        match self {
            Self::Categorical {
                reference_categories,
            } => Some(reference_categories),
            Self::Numeric { .. } => None,
        }
    }
}

/// Reasons a candidate cannot be used as a reference.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateError {
    #[error("unknown gender: {0:?}")]
    UnknownGender(String),

    #[error("unknown reference type: {0:?}")]
    UnknownReferenceType(String),

    #[error("categorical reference has no categories")]
    EmptyCategories,
}

/// One possible reference range for a measured parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeCandidate {
    #[serde(default)]
    pub gender: RangeGender,
    #[serde(default)]
    pub age_min: Option<u32>,
    #[serde(default)]
    pub age_max: Option<u32>,
    #[serde(flatten)]
    pub kind: ReferenceKind,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RangeCandidate {
    /// A numeric candidate applying to every gender and age.
    pub fn numeric(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self::with_kind(ReferenceKind::Numeric {
            reference_min: min,
            reference_max: max,
        })
    }

    /// A categorical candidate applying to every gender and age.
    pub fn categorical(categories: Vec<Category>) -> Self {
        Self::with_kind(ReferenceKind::Categorical {
            reference_categories: categories,
        })
    }

    fn with_kind(kind: ReferenceKind) -> Self {
        Self {
            gender: RangeGender::Both,
            age_min: None,
            age_max: None,
            kind,
            condition: None,
            description: None,
        }
    }

    pub fn for_gender(mut self, gender: RangeGender) -> Self {
        self.gender = gender;
        self
    }

    pub fn for_ages(mut self, age_min: Option<u32>, age_max: Option<u32>) -> Self {
        self.age_min = age_min;
        self.age_max = age_max;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn reference_type(&self) -> ReferenceType {
        self.kind.reference_type()
    }

    /// True when neither age bound is set.
    pub fn is_age_wildcard(&self) -> bool {
        self.age_min.is_none() && self.age_max.is_none()
    }

    /// Inclusive age check; an absent bound is unbounded on that side.
    pub fn covers_age(&self, age: u32) -> bool {
        self.age_min.map_or(true, |min| age >= min) && self.age_max.map_or(true, |max| age <= max)
    }

    /// Reject candidates that cannot describe any reference.
    pub fn validate(&self) -> Result<(), CandidateError> {
        match &self.kind {
            ReferenceKind::Categorical {
                reference_categories,
            } if reference_categories.is_empty() => Err(CandidateError::EmptyCategories),
            _ => Ok(()),
        }
    }
}

/// The reference chosen for a measurement, or the empty sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedReference {
    pub gender: Option<RangeGender>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    #[serde(flatten)]
    pub kind: ReferenceKind,
    pub condition: Option<String>,
    pub description: Option<String>,
    /// Score of the winning candidate (diagnostic only)
    #[serde(skip)]
    pub match_score: Option<u32>,
}

impl ResolvedReference {
    /// The "no reference available" sentinel: numeric, all bounds null.
    pub fn empty() -> Self {
        Self {
            gender: None,
            age_min: None,
            age_max: None,
            kind: ReferenceKind::Numeric {
                reference_min: None,
                reference_max: None,
            },
            condition: None,
            description: None,
            match_score: None,
        }
    }

    pub fn from_candidate(candidate: &RangeCandidate, score: u32) -> Self {
        Self {
            gender: Some(candidate.gender),
            age_min: candidate.age_min,
            age_max: candidate.age_max,
            kind: candidate.kind.clone(),
            condition: candidate.condition.clone(),
            description: candidate.description.clone(),
            match_score: Some(score),
        }
    }

    /// True for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.match_score.is_none()
            && matches!(
                self.kind,
                ReferenceKind::Numeric {
                    reference_min: None,
                    reference_max: None
                }
            )
    }

    pub fn reference_type(&self) -> ReferenceType {
        self.kind.reference_type()
    }
}
