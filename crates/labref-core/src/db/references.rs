//! Standard reference range database operations.

use std::str::FromStr;

use log::{debug, warn};
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{age_from_sql, decimal_from_sql, decimal_to_sql, Database, DbError, DbResult};
use crate::models::{CandidateError, Category, RangeCandidate, RangeGender, ReferenceKind, ReferenceType};
use crate::resolver::{ReferenceQuery, ReferenceRepository, ResolverResult};

/// A curated reference range, optionally scoped to one laboratory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardRange {
    /// Row ID (assigned on insert)
    #[serde(default)]
    pub id: Option<i64>,
    pub parameter_code: String,
    #[serde(default)]
    pub parameter_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub range: RangeCandidate,
    /// Where the range comes from (guideline, manufacturer, ...)
    #[serde(default)]
    pub source: Option<String>,
    /// `None` applies to every laboratory
    #[serde(default)]
    pub laboratory_id: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl StandardRange {
    pub fn new(parameter_code: impl Into<String>, range: RangeCandidate) -> Self {
        Self {
            id: None,
            parameter_code: parameter_code.into(),
            parameter_name: None,
            unit: None,
            range,
            source: None,
            laboratory_id: None,
            active: true,
        }
    }

    pub fn for_laboratory(mut self, laboratory_id: i64) -> Self {
        self.laboratory_id = Some(laboratory_id);
        self
    }
}

const RANGE_COLUMNS: &str = r#"
    id, parameter_code, parameter_name, unit, gender, age_min, age_max,
    reference_type, reference_min, reference_max, reference_categories,
    condition, description, source, laboratory_id, active
"#;

impl Database {
    /// Insert a standard range, returning its row ID.
    pub fn insert_standard_range(&self, range: &StandardRange) -> DbResult<i64> {
        range.range.validate()?;

        let (reference_min, reference_max, categories_json) = match &range.range.kind {
            ReferenceKind::Numeric {
                reference_min,
                reference_max,
            } => (decimal_to_sql(*reference_min), decimal_to_sql(*reference_max), None),
            ReferenceKind::Categorical {
                reference_categories,
            } => (None, None, Some(serde_json::to_string(reference_categories)?)),
        };

        self.conn.execute(
            r#"
            INSERT INTO standard_reference_ranges (
                parameter_code, parameter_name, unit, gender, age_min, age_max,
                reference_type, reference_min, reference_max, reference_categories,
                condition, description, source, laboratory_id, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                range.parameter_code,
                range.parameter_name,
                range.unit,
                range.range.gender.as_str(),
                range.range.age_min,
                range.range.age_max,
                range.range.reference_type().as_str(),
                reference_min,
                reference_max,
                categories_json,
                range.range.condition,
                range.range.description,
                range.source,
                range.laboratory_id,
                range.active,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a standard range by ID.
    pub fn get_standard_range(&self, id: i64) -> DbResult<Option<StandardRange>> {
        let sql = format!("SELECT {} FROM standard_reference_ranges WHERE id = ?", RANGE_COLUMNS);
        let result = self
            .conn
            .query_row(&sql, [id], StandardRangeRow::from_row)
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// All ranges (active or not) for a parameter, in insertion order.
    pub fn list_standard_ranges(&self, parameter_code: &str) -> DbResult<Vec<StandardRange>> {
        let sql = format!(
            "SELECT {} FROM standard_reference_ranges WHERE parameter_code = ? ORDER BY id",
            RANGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([parameter_code], StandardRangeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Exclude a range from lookups without deleting it.
    pub fn deactivate_standard_range(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE standard_reference_ranges SET active = 0 WHERE id = ?",
            [id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Active candidates for a patient, laboratory-specific rows first.
    ///
    /// Gender must be `both` or the patient's own. When the age is known, rows whose
    /// bounds exclude it are filtered out; when unknown, every row is returned.
    ///
    /// Stored values are read leniently: an unparsable bound becomes null and a row
    /// that cannot describe any reference is skipped, both with a warning. Only
    /// SQLite failures are errors.
    pub fn lookup_standard_ranges(&self, query: &ReferenceQuery) -> DbResult<Vec<RangeCandidate>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM standard_reference_ranges
            WHERE active = 1
              AND parameter_code = ?1
              AND (gender = 'both' OR gender = ?2)
              AND (?3 IS NULL OR ((age_min IS NULL OR age_min <= ?3) AND (age_max IS NULL OR age_max >= ?3)))
              AND (laboratory_id IS NULL OR laboratory_id = ?4)
            ORDER BY laboratory_id IS NULL ASC, id ASC
            "#,
            RANGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    query.parameter_code,
                    query.patient.gender.as_range_label(),
                    query.patient.age,
                    query.laboratory_id,
                ],
                StandardRangeRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Standard range lookup for {} matched {} row(s)",
            query.parameter_code,
            rows.len()
        );
        Ok(rows
            .into_iter()
            .filter_map(StandardRangeRow::into_lookup_candidate)
            .collect())
    }
}

impl ReferenceRepository for Database {
    fn lookup(&self, query: &ReferenceQuery) -> ResolverResult<Vec<RangeCandidate>> {
        Ok(self.lookup_standard_ranges(query)?)
    }
}

/// Intermediate row struct for database mapping.
struct StandardRangeRow {
    id: i64,
    parameter_code: String,
    parameter_name: Option<String>,
    unit: Option<String>,
    gender: String,
    age_min: Option<i64>,
    age_max: Option<i64>,
    reference_type: String,
    reference_min: Option<String>,
    reference_max: Option<String>,
    reference_categories: Option<String>,
    condition: Option<String>,
    description: Option<String>,
    source: Option<String>,
    laboratory_id: Option<i64>,
    active: bool,
}

impl StandardRangeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            parameter_code: row.get(1)?,
            parameter_name: row.get(2)?,
            unit: row.get(3)?,
            gender: row.get(4)?,
            age_min: row.get(5)?,
            age_max: row.get(6)?,
            reference_type: row.get(7)?,
            reference_min: row.get(8)?,
            reference_max: row.get(9)?,
            reference_categories: row.get(10)?,
            condition: row.get(11)?,
            description: row.get(12)?,
            source: row.get(13)?,
            laboratory_id: row.get(14)?,
            active: row.get(15)?,
        })
    }
}

impl StandardRangeRow {
    fn into_lookup_candidate(self) -> Option<RangeCandidate> {
        let id = self.id;
        let Some(gender) = RangeGender::parse(&self.gender) else {
            warn!("Skipping standard range #{}: unknown gender {:?}", id, self.gender);
            return None;
        };
        let Some(reference_type) = ReferenceType::parse(&self.reference_type) else {
            warn!(
                "Skipping standard range #{}: unknown reference type {:?}",
                id, self.reference_type
            );
            return None;
        };

        let kind = match reference_type {
            ReferenceType::Numeric => ReferenceKind::Numeric {
                reference_min: decimal_or_null(id, "reference_min", self.reference_min),
                reference_max: decimal_or_null(id, "reference_max", self.reference_max),
            },
            ReferenceType::Categorical => {
                let stored = self
                    .reference_categories
                    .as_deref()
                    .map(serde_json::from_str::<Vec<StoredCategory>>)
                    .transpose();
                let stored = match stored {
                    Ok(stored) => stored.unwrap_or_default(),
                    Err(e) => {
                        warn!("Skipping standard range #{}: unreadable categories ({})", id, e);
                        return None;
                    }
                };
                ReferenceKind::Categorical {
                    reference_categories: stored.into_iter().map(|band| band.into_category(id)).collect(),
                }
            }
        };

        let candidate = RangeCandidate {
            gender,
            age_min: age_or_null(id, "age_min", self.age_min),
            age_max: age_or_null(id, "age_max", self.age_max),
            kind,
            condition: self.condition,
            description: self.description,
        };
        if let Err(e) = candidate.validate() {
            warn!("Skipping standard range #{}: {}", id, e);
            return None;
        }
        Some(candidate)
    }
}

fn decimal_or_null(id: i64, column: &str, value: Option<String>) -> Option<Decimal> {
    decimal_from_sql(column, value).unwrap_or_else(|e| {
        warn!("Ignoring bound of standard range #{}: {}", id, e);
        None
    })
}

fn age_or_null(id: i64, column: &str, value: Option<i64>) -> Option<u32> {
    age_from_sql(column, value).unwrap_or_else(|e| {
        warn!("Ignoring age bound of standard range #{}: {}", id, e);
        None
    })
}

/// Stored band with bounds kept raw until coerced.
#[derive(Deserialize)]
struct StoredCategory {
    name: String,
    #[serde(default)]
    min: Value,
    #[serde(default)]
    max: Value,
}

impl StoredCategory {
    fn into_category(self, id: i64) -> Category {
        let min = band_bound(id, &self.name, &self.min);
        let max = band_bound(id, &self.name, &self.max);
        Category::new(self.name, min, max)
    }
}

fn band_bound(id: i64, band: &str, value: &Value) -> Option<Decimal> {
    let parsed = match value {
        Value::Null => return None,
        Value::String(text) if text.trim().is_empty() => return None,
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
        }
        _ => None,
    };
    if parsed.is_none() {
        warn!("Ignoring bound {} of band {:?} in standard range #{}", value, band, id);
    }
    parsed
}

impl TryFrom<StandardRangeRow> for StandardRange {
    type Error = DbError;

    fn try_from(row: StandardRangeRow) -> Result<Self, Self::Error> {
        let gender =
            RangeGender::parse(&row.gender).ok_or(CandidateError::UnknownGender(row.gender.clone()))?;
        let reference_type = ReferenceType::parse(&row.reference_type)
            .ok_or(CandidateError::UnknownReferenceType(row.reference_type.clone()))?;

        let kind = match reference_type {
            ReferenceType::Numeric => ReferenceKind::Numeric {
                reference_min: decimal_from_sql("reference_min", row.reference_min)?,
                reference_max: decimal_from_sql("reference_max", row.reference_max)?,
            },
            ReferenceType::Categorical => {
                let categories: Vec<Category> = row
                    .reference_categories
                    .map(|json| serde_json::from_str(&json))
                    .transpose()?
                    .unwrap_or_default();
                ReferenceKind::Categorical {
                    reference_categories: categories,
                }
            }
        };

        Ok(StandardRange {
            id: Some(row.id),
            parameter_code: row.parameter_code,
            parameter_name: row.parameter_name,
            unit: row.unit,
            range: RangeCandidate {
                gender,
                age_min: age_from_sql("age_min", row.age_min)?,
                age_max: age_from_sql("age_max", row.age_max)?,
                kind,
                condition: row.condition,
                description: row.description,
            },
            source: row.source,
            laboratory_id: row.laboratory_id,
            active: row.active,
        })
    }
}
