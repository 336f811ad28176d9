//! SQLite schema definition.

/// Complete database schema for labref.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Laboratories
-- ============================================================================

CREATE TABLE IF NOT EXISTS laboratories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,                          -- canonical display name
    name_key TEXT NOT NULL UNIQUE,               -- folded name used for identity
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Standard Reference Ranges
-- ============================================================================

CREATE TABLE IF NOT EXISTS standard_reference_ranges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parameter_code TEXT NOT NULL,
    parameter_name TEXT,
    unit TEXT,
    gender TEXT NOT NULL DEFAULT 'both' CHECK (gender IN ('male', 'female', 'both')),
    age_min INTEGER,
    age_max INTEGER,
    reference_type TEXT NOT NULL DEFAULT 'numeric' CHECK (reference_type IN ('numeric', 'categorical')),
    reference_min TEXT,                          -- decimal literal
    reference_max TEXT,                          -- decimal literal
    reference_categories TEXT,                   -- JSON array of {name, min, max}
    condition TEXT,
    description TEXT,
    source TEXT,
    laboratory_id INTEGER REFERENCES laboratories(id),   -- NULL = applies to every laboratory
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_ranges_parameter ON standard_reference_ranges(parameter_code, active);
CREATE INDEX IF NOT EXISTS idx_ranges_laboratory ON standard_reference_ranges(laboratory_id);

-- ============================================================================
-- Measurements (replaced as a whole when a document is reprocessed)
-- ============================================================================

CREATE TABLE IF NOT EXISTS measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id TEXT NOT NULL,
    parameter_code TEXT NOT NULL,
    numeric_value TEXT,
    text_value TEXT,
    reference_min TEXT,
    reference_max TEXT,
    reference_gender TEXT,
    reference_age_min INTEGER,
    reference_age_max INTEGER,
    reference_condition TEXT,
    reference_description TEXT,
    reference_categories TEXT,                   -- JSON array, NULL for numeric references
    reference_type TEXT NOT NULL CHECK (reference_type IN ('numeric', 'categorical')),
    status TEXT NOT NULL CHECK (status IN ('normal', 'low', 'high', 'critical')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_measurements_document ON measurements(document_id);
"#;
