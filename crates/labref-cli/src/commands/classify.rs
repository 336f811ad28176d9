use anyhow::Context;
use chrono::NaiveDate;
use labref_core::models::{age_on, MeasurementRecord, PatientContext, PatientGender, UNKNOWN_LABORATORY};
use labref_core::resolver::ResultClassifier;
use labref_extract::{classify_payload, parse_lab_payload, LabPayload};
use log::info;
use serde::Serialize;
use std::path::Path;

use super::{load_config, open_database};
use crate::output;

/// Patient details given on the command line.
pub struct PatientArgs {
    pub gender: String,
    pub age: Option<u32>,
    pub birth_date: Option<NaiveDate>,
}

/// Everything printed for one classified report.
#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub laboratory: String,
    pub laboratory_id: Option<i64>,
    pub patient: PatientContext,
    pub measurements: Vec<MeasurementRecord>,
}

pub fn run(
    input_file: &Path,
    patient_args: PatientArgs,
    db_path: Option<&Path>,
    config_path: Option<&Path>,
    document_id: Option<&str>,
    output_format: &str,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let normalizer = config.normalizer();

    let text = std::fs::read_to_string(input_file)
        .with_context(|| format!("reading {}", input_file.display()))?;
    let payload = parse_lab_payload(&text)
        .with_context(|| format!("parsing {}", input_file.display()))?;
    let patient = patient_context(&patient_args, &payload);
    info!(
        "Classifying {} parameter(s) for patient {} age {:?}",
        payload.parameter_count(),
        patient.gender,
        patient.age
    );

    let report = match db_path {
        Some(path) => {
            let mut db = open_database(Some(path))?;
            let laboratory = db.find_or_create_laboratory(payload.laboratory_name(), &normalizer)?;

            let measurements = {
                let classifier = ResultClassifier::with_repository(&db).with_vocabulary(config.vocabulary());
                classify_payload(&payload, &patient, Some(laboratory.id), &classifier)?
            };

            if let Some(document_id) = document_id {
                db.replace_measurements(document_id, &measurements)?;
            }

            ClassifyReport {
                laboratory: laboratory.name,
                laboratory_id: Some(laboratory.id),
                patient,
                measurements,
            }
        }
        None => {
            let classifier = ResultClassifier::new().with_vocabulary(config.vocabulary());
            ClassifyReport {
                laboratory: normalizer.normalize(payload.laboratory_name().unwrap_or(UNKNOWN_LABORATORY)),
                laboratory_id: None,
                patient,
                measurements: classify_payload(&payload, &patient, None, &classifier)?,
            }
        }
    };

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_report(&report),
    }

    Ok(())
}

/// Explicit age wins; otherwise age on the collection date (or today) from the birth date.
fn patient_context(args: &PatientArgs, payload: &LabPayload) -> PatientContext {
    let gender = PatientGender::from_label(&args.gender);
    let age = args.age.or_else(|| {
        let birth_date = args.birth_date?;
        let on = payload
            .collection_date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok())
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        age_on(birth_date, on)
    });
    PatientContext::new(gender, age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(age: Option<u32>, birth_date: Option<&str>) -> PatientArgs {
        PatientArgs {
            gender: "F".into(),
            age,
            birth_date: birth_date.map(|d| d.parse().unwrap()),
        }
    }

    #[test]
    fn test_age_from_collection_date() {
        let payload = LabPayload {
            collection_date: Some("2025-03-14".into()),
            ..Default::default()
        };

        let patient = patient_context(&args(None, Some("1980-03-15")), &payload);
        assert_eq!(patient.gender, PatientGender::Female);
        assert_eq!(patient.age, Some(44));

        let patient = patient_context(&args(None, Some("1980-03-14")), &payload);
        assert_eq!(patient.age, Some(45));
    }

    #[test]
    fn test_explicit_age_wins() {
        let payload = LabPayload::default();
        let patient = patient_context(&args(Some(30), None), &payload);
        assert_eq!(patient.age, Some(30));

        let patient = patient_context(&args(None, None), &payload);
        assert_eq!(patient.age, None);
    }
}
