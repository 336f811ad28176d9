//! Typed boundary for AI-extracted lab report payloads.
//!
//! This crate turns the loosely typed JSON produced by the report extractor into
//! engine inputs and runs every parameter through a [`ResultClassifier`].

pub mod candidates;
pub mod payload;

pub use candidates::*;
pub use payload::*;

use log::{info, warn};

use labref_core::models::{MeasurementRecord, PatientContext};
use labref_core::resolver::{ReferenceRequest, ResultClassifier};

/// Classify every parameter of every exam group in a payload.
///
/// Parameters without a code are skipped. Invalid printed ranges are dropped
/// individually; the parameter is still classified with whatever remains, and a
/// report whose printed ranges were all dropped gets no reference rather than a
/// stored one.
pub fn classify_payload(
    payload: &LabPayload,
    patient: &PatientContext,
    laboratory_id: Option<i64>,
    classifier: &ResultClassifier<'_>,
) -> ExtractionResult<Vec<MeasurementRecord>> {
    let mut records = Vec::with_capacity(payload.parameter_count());

    for group in &payload.results {
        for parameter in &group.parameters {
            let Some(code) = parameter.code() else {
                warn!(
                    "Skipping parameter without code in exam group {:?}",
                    group.exam_type_code
                );
                continue;
            };

            let ranges = parameter.range_candidates();
            let mut request = ReferenceRequest::new(code, patient)
                .document_ranges(&ranges)
                .printed_ranges(parameter.reference_ranges.len());
            if let Some(id) = laboratory_id {
                request = request.laboratory(id);
            }

            let value = parameter.measured_value();
            let classification = classifier.classify(&value, &request)?;
            records.push(MeasurementRecord::new(code, &value, &classification));
        }
    }

    info!(
        "Classified {} parameter(s) from {} exam group(s)",
        records.len(),
        payload.results.len()
    );
    Ok(records)
}
