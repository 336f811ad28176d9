//! Labref Core Library
//!
//! Reference range resolution and result classification for clinical lab reports.
//!
//! # Architecture
//!
//! ```text
//! Measured value + patient (gender, age) + laboratory
//!                        │
//!          ┌─────────────▼─────────────┐
//!          │     Reference sources     │  document ranges, then stored standards
//!          └─────────────┬─────────────┘
//!                        │
//!          ┌─────────────▼─────────────┐
//!          │       RangeSelector       │  eliminate, score, first-listed tie-break
//!          └─────────────┬─────────────┘
//!                        │
//!            numeric ────┴──── categorical
//!               │                   │
//!        min/max bounds      band match + SeverityVocabulary
//!               │                   │
//!               └─────────┬─────────┘
//!                         ▼
//!          normal · low · high · critical
//! ```
//!
//! # Core Principle
//!
//! **Missing information never escalates.** No reference, text values, open-ended
//! numeric bounds and unknown band names all classify as `normal`.
//!
//! # Modules
//!
//! - [`db`]: SQLite store for laboratories, standard ranges and measurements
//! - [`models`]: Domain types (RangeCandidate, ResolvedReference, Status, etc.)
//! - [`resolver`]: Range selection, categorical matching, facility normalization
//! - [`config`]: Alias and severity tables loaded from JSON

pub mod config;
pub mod db;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use config::EngineConfig;
pub use db::Database;
pub use models::{
    Category, Classification, ClassificationResult, Laboratory, MeasuredValue, MeasurementRecord,
    PatientContext, PatientGender, RangeCandidate, RangeGender, ReferenceKind, ReferenceType,
    ResolvedReference, Status,
};
pub use resolver::{
    CategoryMatcher, FacilityNameNormalizer, RangeSelector, ReferenceRepository, ReferenceRequest,
    ResultClassifier, SeverityVocabulary,
};
