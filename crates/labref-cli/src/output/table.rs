use std::fmt::Display;

use labref_core::db::StandardRange;
use labref_core::models::{MeasurementRecord, ReferenceKind};

use crate::commands::classify::ClassifyReport;

pub fn print_report(report: &ClassifyReport) {
    match report.laboratory_id {
        Some(id) => println!("=== {} (#{}) ===\n", report.laboratory, id),
        None => println!("=== {} ===\n", report.laboratory),
    }
    println!(
        "  Patient: {}, age {}\n",
        report.patient.gender,
        fmt_opt(report.patient.age)
    );

    if report.measurements.is_empty() {
        println!("  No parameters found");
        return;
    }

    let max_code = report
        .measurements
        .iter()
        .map(|m| m.parameter_code.chars().count())
        .max()
        .unwrap_or(10);

    for m in &report.measurements {
        let marker = if m.status.is_abnormal() { " *" } else { "" };
        println!(
            "  {:<width$}  {:>10}  [{} .. {}]  -> {}{}",
            m.parameter_code,
            value_text(m),
            fmt_opt(m.reference_min),
            fmt_opt(m.reference_max),
            m.status,
            marker,
            width = max_code
        );
    }

    let abnormal = report
        .measurements
        .iter()
        .filter(|m| m.status.is_abnormal())
        .count();
    println!("\n  {} of {} outside reference", abnormal, report.measurements.len());
}

pub fn print_ranges(parameter_code: &str, ranges: &[StandardRange]) {
    println!("=== {} ===\n", parameter_code);

    if ranges.is_empty() {
        println!("  No reference ranges stored");
        return;
    }

    for range in ranges {
        let candidate = &range.range;
        let inactive = if range.active { "" } else { " (inactive)" };
        println!(
            "  #{:<4} {:<6} age {}..{}  lab {}{}",
            fmt_opt(range.id),
            candidate.gender.as_str(),
            fmt_opt(candidate.age_min),
            fmt_opt(candidate.age_max),
            fmt_opt(range.laboratory_id),
            inactive
        );
        match &candidate.kind {
            ReferenceKind::Numeric {
                reference_min,
                reference_max,
            } => println!("        {} .. {}", fmt_opt(*reference_min), fmt_opt(*reference_max)),
            ReferenceKind::Categorical {
                reference_categories,
            } => {
                for band in reference_categories {
                    println!("        {}: {} .. {}", band.name, fmt_opt(band.min), fmt_opt(band.max));
                }
            }
        }
        if let Some(condition) = &candidate.condition {
            println!("        condition: {}", condition);
        }
    }
}

fn value_text(m: &MeasurementRecord) -> String {
    match (&m.numeric_value, &m.text_value) {
        (Some(v), _) => v.to_string(),
        (None, Some(t)) => t.clone(),
        (None, None) => "-".into(),
    }
}

fn fmt_opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}
