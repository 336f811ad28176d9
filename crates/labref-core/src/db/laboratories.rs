//! Laboratory database operations.

use log::info;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Laboratory, UNKNOWN_LABORATORY};
use crate::resolver::FacilityNameNormalizer;

impl Database {
    /// Resolve a free-text laboratory name to a stored laboratory, creating it if needed.
    ///
    /// Blank names map to the unknown-laboratory record. Identity is the folded key of
    /// the normalized name, so "LABMAX" and "Lab Max" land on the same row.
    pub fn find_or_create_laboratory(
        &self,
        raw_name: Option<&str>,
        normalizer: &FacilityNameNormalizer,
    ) -> DbResult<Laboratory> {
        let raw_name = raw_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_LABORATORY);
        let name = normalizer.normalize(raw_name);
        let name_key = normalizer.identity_key(&name);

        if let Some(existing) = self.get_laboratory_by_key(&name_key)? {
            return Ok(existing);
        }

        self.conn.execute(
            "INSERT INTO laboratories (name, name_key) VALUES (?1, ?2)",
            params![name, name_key],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Created laboratory {} ({:?})", id, name);

        self.get_laboratory(id)?
            .ok_or_else(|| super::DbError::NotFound(format!("laboratory {}", id)))
    }

    /// Get a laboratory by ID.
    pub fn get_laboratory(&self, id: i64) -> DbResult<Option<Laboratory>> {
        self.conn
            .query_row(
                "SELECT id, name, active, created_at FROM laboratories WHERE id = ?",
                [id],
                laboratory_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    fn get_laboratory_by_key(&self, name_key: &str) -> DbResult<Option<Laboratory>> {
        self.conn
            .query_row(
                "SELECT id, name, active, created_at FROM laboratories WHERE name_key = ?",
                [name_key],
                laboratory_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all laboratories.
    pub fn list_laboratories(&self) -> DbResult<Vec<Laboratory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, active, created_at FROM laboratories ORDER BY name")?;

        let rows = stmt.query_map([], laboratory_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn laboratory_from_row(row: &Row<'_>) -> rusqlite::Result<Laboratory> {
    Ok(Laboratory {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
        created_at: row.get(3)?,
    })
}
