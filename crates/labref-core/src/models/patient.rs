//! Patient demographic context.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Patient gender as recorded on the account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatientGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl PatientGender {
    /// Parse a gender label; anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            "other" => Self::Other,
            _ => Self::Unknown,
        }
    }

    /// Label used when querying stored references (`None` for other/unknown).
    pub fn as_range_label(&self) -> Option<&'static str> {
        match self {
            Self::Male => Some("male"),
            Self::Female => Some("female"),
            Self::Other | Self::Unknown => None,
        }
    }
}

impl fmt::Display for PatientGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The demographic facts a reference range can be scoped by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientContext {
    pub gender: PatientGender,
    /// Age in completed years; `None` when the birth date is unknown
    pub age: Option<u32>,
}

impl PatientContext {
    pub fn new(gender: PatientGender, age: Option<u32>) -> Self {
        Self { gender, age }
    }

    /// Build a context from a birth date, computing age on `on`.
    pub fn from_birth_date(gender: PatientGender, birth_date: NaiveDate, on: NaiveDate) -> Self {
        Self {
            gender,
            age: age_on(birth_date, on),
        }
    }
}

/// Completed years between `birth_date` and `on`; `None` if born after `on`.
pub fn age_on(birth_date: NaiveDate, on: NaiveDate) -> Option<u32> {
    if birth_date > on {
        return None;
    }
    let mut years = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
