//! Measurement database operations.

use log::info;
use rusqlite::params;

use super::{age_from_sql, decimal_from_sql, decimal_to_sql, Database, DbError, DbResult};
use crate::models::{CandidateError, MeasurementRecord, RangeGender, ReferenceType, Status};

impl Database {
    /// Replace every measurement of a document.
    ///
    /// Runs in a single transaction: readers see either the old set or the new one.
    pub fn replace_measurements(&mut self, document_id: &str, records: &[MeasurementRecord]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;

        let removed = tx.execute("DELETE FROM measurements WHERE document_id = ?", [document_id])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO measurements (
                    document_id, parameter_code, numeric_value, text_value,
                    reference_min, reference_max, reference_gender,
                    reference_age_min, reference_age_max, reference_condition,
                    reference_description, reference_categories, reference_type, status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )?;

            for record in records {
                let categories_json = record
                    .reference_categories
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;

                stmt.execute(params![
                    document_id,
                    record.parameter_code,
                    decimal_to_sql(record.numeric_value),
                    record.text_value,
                    decimal_to_sql(record.reference_min),
                    decimal_to_sql(record.reference_max),
                    record.reference_gender.map(|g| g.as_str()),
                    record.reference_age_min,
                    record.reference_age_max,
                    record.reference_condition,
                    record.reference_description,
                    categories_json,
                    record.reference_type.as_str(),
                    record.status.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "Stored {} measurement(s) for document {} (replaced {})",
            records.len(),
            document_id,
            removed
        );
        Ok(records.len())
    }

    /// Measurements of a document, in insertion order.
    pub fn list_measurements(&self, document_id: &str) -> DbResult<Vec<MeasurementRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT parameter_code, numeric_value, text_value, reference_min, reference_max,
                   reference_gender, reference_age_min, reference_age_max, reference_condition,
                   reference_description, reference_categories, reference_type, status
            FROM measurements
            WHERE document_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map([document_id], |row| {
                Ok(MeasurementRow {
                    parameter_code: row.get(0)?,
                    numeric_value: row.get(1)?,
                    text_value: row.get(2)?,
                    reference_min: row.get(3)?,
                    reference_max: row.get(4)?,
                    reference_gender: row.get(5)?,
                    reference_age_min: row.get(6)?,
                    reference_age_max: row.get(7)?,
                    reference_condition: row.get(8)?,
                    reference_description: row.get(9)?,
                    reference_categories: row.get(10)?,
                    reference_type: row.get(11)?,
                    status: row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Intermediate row struct for database mapping.
struct MeasurementRow {
    parameter_code: String,
    numeric_value: Option<String>,
    text_value: Option<String>,
    reference_min: Option<String>,
    reference_max: Option<String>,
    reference_gender: Option<String>,
    reference_age_min: Option<i64>,
    reference_age_max: Option<i64>,
    reference_condition: Option<String>,
    reference_description: Option<String>,
    reference_categories: Option<String>,
    reference_type: String,
    status: String,
}

impl TryFrom<MeasurementRow> for MeasurementRecord {
    type Error = DbError;

    fn try_from(row: MeasurementRow) -> Result<Self, Self::Error> {
        let reference_gender = row
            .reference_gender
            .map(|g| RangeGender::parse(&g).ok_or(CandidateError::UnknownGender(g)))
            .transpose()?;
        let reference_type = ReferenceType::parse(&row.reference_type)
            .ok_or(CandidateError::UnknownReferenceType(row.reference_type.clone()))?;
        let status = Status::parse(&row.status)
            .ok_or_else(|| DbError::InvalidData(format!("status: {:?}", row.status)))?;

        Ok(MeasurementRecord {
            parameter_code: row.parameter_code,
            numeric_value: decimal_from_sql("numeric_value", row.numeric_value)?,
            text_value: row.text_value,
            reference_min: decimal_from_sql("reference_min", row.reference_min)?,
            reference_max: decimal_from_sql("reference_max", row.reference_max)?,
            reference_gender,
            reference_age_min: age_from_sql("reference_age_min", row.reference_age_min)?,
            reference_age_max: age_from_sql("reference_age_max", row.reference_age_max)?,
            reference_condition: row.reference_condition,
            reference_description: row.reference_description,
            reference_categories: row
                .reference_categories
                .map(|json| serde_json::from_str(&json))
                .transpose()?,
            reference_type,
            status,
        })
    }
}
