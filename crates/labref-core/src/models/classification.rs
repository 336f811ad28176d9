//! Classification outcome models.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::reference::{Category, RangeGender, ReferenceKind, ReferenceType, ResolvedReference};

/// Severity taxonomy every classification path converges to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Low,
    High,
    Critical,
}

impl Status {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Low => "low",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn is_abnormal(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measured result as printed on the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MeasuredValue {
    Numeric(Decimal),
    Text(String),
}

impl MeasuredValue {
    /// Numeric-looking strings ("14.5", " 85 ") become numeric; the rest is text.
    pub fn parse(raw: &str) -> Self {
        match parse_decimal(raw) {
            Some(value) => Self::Numeric(value),
            None => Self::Text(raw.to_string()),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

/// Parse a plain or scientific decimal literal; blank or garbage yields `None`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Status plus the bounds shown to the end user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub status: Status,
    /// Numeric bounds, or the bounds of the matched band for categorical references
    pub reference_min: Option<Decimal>,
    pub reference_max: Option<Decimal>,
    /// Name of the matched band (categorical only)
    pub matched_category: Option<String>,
}

impl ClassificationResult {
    pub fn normal() -> Self {
        Self {
            status: Status::Normal,
            reference_min: None,
            reference_max: None,
            matched_category: None,
        }
    }
}

/// Full outcome for one measured parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub reference: ResolvedReference,
    pub result: ClassificationResult,
}

/// Denormalized row written per measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    pub parameter_code: String,
    pub numeric_value: Option<Decimal>,
    pub text_value: Option<String>,
    pub reference_min: Option<Decimal>,
    pub reference_max: Option<Decimal>,
    pub reference_gender: Option<RangeGender>,
    pub reference_age_min: Option<u32>,
    pub reference_age_max: Option<u32>,
    pub reference_condition: Option<String>,
    pub reference_description: Option<String>,
    pub reference_categories: Option<Vec<Category>>,
    pub reference_type: ReferenceType,
    pub status: Status,
}

impl MeasurementRecord {
    /// Flatten a classification into persistable columns.
    pub fn new(parameter_code: impl Into<String>, value: &MeasuredValue, classification: &Classification) -> Self {
        let (numeric_value, text_value) = match value {
            MeasuredValue::Numeric(v) => (Some(*v), None),
            MeasuredValue::Text(t) => (None, Some(t.clone())),
        };
        let reference = &classification.reference;
        let reference_categories = match &reference.kind {
            ReferenceKind::Categorical {
                reference_categories,
            } => Some(reference_categories.clone()),
            ReferenceKind::Numeric { .. } => None,
        };

        Self {
            parameter_code: parameter_code.into(),
            numeric_value,
            text_value,
            reference_min: classification.result.reference_min,
            reference_max: classification.result.reference_max,
            reference_gender: reference.gender,
            reference_age_min: reference.age_min,
            reference_age_max: reference.age_max,
            reference_condition: reference.condition.clone(),
            reference_description: reference.description.clone(),
            reference_categories,
            reference_type: reference.reference_type(),
            status: classification.result.status,
        }
    }
}
