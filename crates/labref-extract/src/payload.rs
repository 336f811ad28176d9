//! AI-extracted lab report payload.
//!
//! The extractor returns loosely typed JSON, sometimes wrapped in Markdown fences
//! or surrounded by prose. Fields that carry numbers are kept as raw JSON values
//! here and coerced leniently in [`crate::candidates`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use labref_core::resolver::ResolverError;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Classification failed: {0}")]
    Resolver(#[from] ResolverError),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Top-level extraction result for one report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabPayload {
    #[serde(default)]
    pub laboratory_name: Option<String>,
    #[serde(default)]
    pub collection_date: Option<String>,
    #[serde(default)]
    pub protocol_number: Option<String>,
    #[serde(default)]
    pub requesting_doctor: Option<String>,
    #[serde(default)]
    pub crm_doctor: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ExamGroup>,
}

impl LabPayload {
    /// Laboratory name, if present and not blank.
    pub fn laboratory_name(&self) -> Option<&str> {
        self.laboratory_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Total number of parameters across all exam groups.
    pub fn parameter_count(&self) -> usize {
        self.results.iter().map(|group| group.parameters.len()).sum()
    }
}

/// Parameters reported under one exam type (e.g. a lipid panel).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExamGroup {
    #[serde(default)]
    pub exam_type_code: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<RawParameter>,
}

/// One measured parameter as extracted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawParameter {
    #[serde(default)]
    pub parameter_code: Option<String>,
    #[serde(default)]
    pub parameter_name: Option<String>,
    /// Number or string
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_ranges: Vec<RawReferenceRange>,
}

/// A reference range printed on the report, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawReferenceRange {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age_min: Value,
    #[serde(default)]
    pub age_max: Value,
    #[serde(default)]
    pub reference_min: Value,
    #[serde(default)]
    pub reference_max: Value,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_categories: Vec<RawCategory>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub age_description: Option<String>,
}

/// A named band before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min: Value,
    #[serde(default)]
    pub max: Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse extractor output into a payload.
pub fn parse_lab_payload(response: &str) -> ExtractionResult<LabPayload> {
    let content = strip_code_fence(response.trim());

    // Tolerate prose around the object
    let json_start = content.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = content.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let payload: LabPayload = serde_json::from_str(&content[json_start..=json_end])?;
    Ok(payload)
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "laboratory_name": "LABMAX",
        "collection_date": "2025-03-14",
        "results": [
            {
                "exam_type_code": "HEMOGRAMA",
                "parameters": [
                    {
                        "parameter_code": "HEMOGLOBINA",
                        "parameter_name": "Hemoglobina",
                        "value": 14.2,
                        "unit": "g/dL",
                        "reference_ranges": [
                            {"gender": "male", "reference_min": 13.5, "reference_max": "17.5"}
                        ]
                    },
                    {"parameter_code": "ASPECTO", "value": "Límpido", "reference_ranges": null}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_plain() {
        let payload = parse_lab_payload(SAMPLE).unwrap();

        assert_eq!(payload.laboratory_name(), Some("LABMAX"));
        assert_eq!(payload.results.len(), 1);
        assert_eq!(payload.parameter_count(), 2);
        let parameters = &payload.results[0].parameters;
        assert_eq!(parameters[0].reference_ranges.len(), 1);
        assert!(parameters[1].reference_ranges.is_empty());
    }

    #[test]
    fn test_parse_fenced() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        assert_eq!(parse_lab_payload(&fenced).unwrap().parameter_count(), 2);

        let fenced = format!("```\n{}\n```", SAMPLE);
        assert_eq!(parse_lab_payload(&fenced).unwrap().parameter_count(), 2);
    }

    #[test]
    fn test_parse_with_prose() {
        let response = format!("Aqui está o resultado:\n{}\nEspero ter ajudado.", SAMPLE);
        assert_eq!(parse_lab_payload(&response).unwrap().parameter_count(), 2);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_lab_payload("no json here"),
            Err(ExtractionError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_lab_payload("} {"),
            Err(ExtractionError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_lab_payload("{\"results\": [}"),
            Err(ExtractionError::JsonParse(_))
        ));
    }

    #[test]
    fn test_blank_laboratory_name() {
        let payload = parse_lab_payload(r#"{"laboratory_name": "   ", "results": null}"#).unwrap();
        assert_eq!(payload.laboratory_name(), None);
        assert!(payload.results.is_empty());
    }
}
