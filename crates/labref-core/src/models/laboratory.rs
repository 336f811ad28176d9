//! Laboratory (facility) identity.

use serde::{Deserialize, Serialize};

/// Name used when a report does not identify its laboratory.
pub const UNKNOWN_LABORATORY: &str = "Laboratório Desconhecido";

/// A laboratory that issued one or more reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Laboratory {
    /// Row ID
    pub id: i64,
    /// Canonical display name
    pub name: String,
    pub active: bool,
    /// Creation timestamp
    pub created_at: String,
}
