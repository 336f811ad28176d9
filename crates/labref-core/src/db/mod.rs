//! Database layer for labref.

mod laboratories;
mod measurements;
mod references;
mod schema;

pub use references::*;
pub use schema::*;

use rusqlite::Connection;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    #[error("Invalid reference range: {0}")]
    Candidate(#[from] crate::models::CandidateError),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Decimals are stored as TEXT to keep their exact scale.
fn decimal_to_sql(value: Option<Decimal>) -> Option<String> {
    value.map(|d| d.to_string())
}

fn decimal_from_sql(column: &str, value: Option<String>) -> DbResult<Option<Decimal>> {
    value
        .map(|text| {
            Decimal::from_str(&text)
                .map_err(|e| DbError::InvalidData(format!("{}: {:?} ({})", column, text, e)))
        })
        .transpose()
}

fn age_from_sql(column: &str, value: Option<i64>) -> DbResult<Option<u32>> {
    value
        .map(|age| {
            u32::try_from(age).map_err(|_| DbError::InvalidData(format!("{}: {}", column, age)))
        })
        .transpose()
}
