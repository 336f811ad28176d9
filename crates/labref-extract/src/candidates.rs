//! Conversion of raw payload values into typed engine inputs.
//!
//! Bounds and ages are coerced leniently: anything that is not a clean number
//! (empty strings, prose, fractional ages) becomes `None`. Only structural problems
//! (unknown gender or reference type, categorical without bands) reject a range.

use std::str::FromStr;

use log::warn;
use rust_decimal::Decimal;
use serde_json::Value;

use labref_core::models::{
    parse_decimal, CandidateError, Category, MeasuredValue, RangeCandidate, RangeGender, ReferenceType,
};

use crate::payload::{RawCategory, RawParameter, RawReferenceRange};

/// Numeric JSON value or numeric-looking string as a decimal.
pub fn lenient_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Non-negative whole number of years, from a number or a string.
pub fn lenient_age(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(age) => u32::try_from(age).ok(),
            None => n
                .as_f64()
                .filter(|age| *age >= 0.0 && age.fract() == 0.0 && *age <= f64::from(u32::MAX))
                .map(|age| age as u32),
        },
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(text: &Option<String>) -> Option<&str> {
    text.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

impl RawCategory {
    pub fn to_category(&self) -> Category {
        Category::new(
            self.name.trim(),
            lenient_decimal(&self.min),
            lenient_decimal(&self.max),
        )
    }
}

impl RawReferenceRange {
    /// Validate into a candidate. Missing gender means "both"; missing type means numeric.
    pub fn to_candidate(&self) -> Result<RangeCandidate, CandidateError> {
        let gender = match non_blank(&self.gender) {
            None => RangeGender::Both,
            Some(label) => {
                RangeGender::parse(label).ok_or_else(|| CandidateError::UnknownGender(label.to_string()))?
            }
        };
        let reference_type = match non_blank(&self.reference_type) {
            None => ReferenceType::Numeric,
            Some(label) => ReferenceType::parse(label)
                .ok_or_else(|| CandidateError::UnknownReferenceType(label.to_string()))?,
        };

        let mut candidate = match reference_type {
            ReferenceType::Numeric => RangeCandidate::numeric(
                lenient_decimal(&self.reference_min),
                lenient_decimal(&self.reference_max),
            ),
            ReferenceType::Categorical => RangeCandidate::categorical(
                self.reference_categories
                    .iter()
                    .map(RawCategory::to_category)
                    .collect(),
            ),
        }
        .for_gender(gender)
        .for_ages(lenient_age(&self.age_min), lenient_age(&self.age_max));

        if let Some(condition) = non_blank(&self.condition) {
            candidate = candidate.with_condition(condition);
        }
        if let Some(description) = non_blank(&self.age_description) {
            candidate = candidate.with_description(description);
        }

        candidate.validate()?;
        Ok(candidate)
    }
}

/// Valid candidates for a parameter; invalid ranges are logged and dropped.
pub fn to_range_candidates(parameter_code: &str, ranges: &[RawReferenceRange]) -> Vec<RangeCandidate> {
    ranges
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match raw.to_candidate() {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!("Dropping reference range #{} of {}: {}", index, parameter_code, e);
                None
            }
        })
        .collect()
}

impl RawParameter {
    /// Parameter code, if present and not blank.
    pub fn code(&self) -> Option<&str> {
        non_blank(&self.parameter_code)
    }

    /// The measured value: numbers and numeric strings are numeric, the rest is text.
    pub fn measured_value(&self) -> MeasuredValue {
        match &self.value {
            Value::String(s) => MeasuredValue::parse(s),
            Value::Null => MeasuredValue::Text(String::new()),
            other => match lenient_decimal(other) {
                Some(value) => MeasuredValue::Numeric(value),
                None => MeasuredValue::Text(other.to_string()),
            },
        }
    }

    pub fn range_candidates(&self) -> Vec<RangeCandidate> {
        to_range_candidates(self.code().unwrap_or_default(), &self.reference_ranges)
    }
}
