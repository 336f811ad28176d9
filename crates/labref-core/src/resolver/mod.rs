//! Reference resolution and result classification.
//!
//! Pipeline: Reference sources → Range selection → Band matching → Status

mod category;
mod normalizer;
mod selector;
mod source;

pub use category::*;
pub use normalizer::*;
pub use selector::*;
pub use source::*;

use log::{debug, warn};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    Classification, ClassificationResult, MeasuredValue, ReferenceKind, ResolvedReference, Status,
};

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Classifies measured values against the best available reference.
pub struct ResultClassifier<'a> {
    sources: Vec<Box<dyn ReferenceSource + 'a>>,
    selector: RangeSelector,
    matcher: CategoryMatcher,
}

impl Default for ResultClassifier<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ResultClassifier<'a> {
    /// Classifier that only consults per-document ranges.
    pub fn new() -> Self {
        Self::with_sources(vec![Box::new(DocumentRanges)])
    }

    /// Classifier that falls back to stored standard ranges.
    pub fn with_repository(repository: &'a dyn ReferenceRepository) -> Self {
        Self::with_sources(vec![
            Box::new(DocumentRanges),
            Box::new(StandardRanges::new(repository)),
        ])
    }

    /// Classifier with an explicit, ordered source chain.
    pub fn with_sources(sources: Vec<Box<dyn ReferenceSource + 'a>>) -> Self {
        Self {
            sources,
            selector: RangeSelector::new(),
            matcher: CategoryMatcher::new(),
        }
    }

    /// Replace the band-name vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: SeverityVocabulary) -> Self {
        self.matcher = CategoryMatcher::with_vocabulary(vocabulary);
        self
    }

    /// Names of the configured sources, in consultation order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Pick the reference for a request.
    ///
    /// The first source with candidates decides; its selection is final even
    /// when every candidate gets eliminated. A source that claims the request
    /// decides it too, yielding the empty reference when nothing usable is left.
    pub fn resolve(&self, request: &ReferenceRequest<'_>) -> ResolverResult<ResolvedReference> {
        for source in &self.sources {
            let candidates = source.candidates(request)?;
            if candidates.is_empty() {
                if source.claims(request) {
                    warn!(
                        "No usable {} reference for {}; fallback skipped",
                        source.name(),
                        request.parameter_code
                    );
                    return Ok(ResolvedReference::empty());
                }
                continue;
            }

            debug!(
                "Using {} {} candidate(s) for {}",
                candidates.len(),
                source.name(),
                request.parameter_code
            );
            let reference = self.selector.select(&candidates, request.patient);
            if reference.is_empty() {
                warn!(
                    "No {} reference matched {} (gender {}, age {:?}, {} checked)",
                    source.name(),
                    request.parameter_code,
                    request.patient.gender,
                    request.patient.age,
                    candidates.len()
                );
            }
            return Ok(reference);
        }

        warn!(
            "No reference range found for {} (gender {}, age {:?}, laboratory {:?})",
            request.parameter_code, request.patient.gender, request.patient.age, request.laboratory_id
        );
        Ok(ResolvedReference::empty())
    }

    /// Resolve a reference for the request and classify the value against it.
    pub fn classify(&self, value: &MeasuredValue, request: &ReferenceRequest<'_>) -> ResolverResult<Classification> {
        let reference = self.resolve(request)?;
        let result = self.classify_against(value, &reference);
        Ok(Classification { reference, result })
    }

    /// Classify a value against an already resolved reference.
    pub fn classify_against(&self, value: &MeasuredValue, reference: &ResolvedReference) -> ClassificationResult {
        match (&reference.kind, value.as_decimal()) {
            (
                ReferenceKind::Numeric {
                    reference_min,
                    reference_max,
                },
                numeric,
            ) => ClassificationResult {
                status: numeric
                    .map(|v| classify_numeric(v, *reference_min, *reference_max))
                    .unwrap_or(Status::Normal),
                reference_min: *reference_min,
                reference_max: *reference_max,
                matched_category: None,
            },
            (ReferenceKind::Categorical { .. }, None) => ClassificationResult::normal(),
            (
                ReferenceKind::Categorical {
                    reference_categories,
                },
                Some(v),
            ) => {
                let matched = self.matcher.classify(v, reference_categories);
                let (reference_min, reference_max, matched_category) = match matched.band {
                    Some(band) => (band.min, band.max, Some(band.name)),
                    None => (None, None, None),
                };
                ClassificationResult {
                    status: matched.status,
                    reference_min,
                    reference_max,
                    matched_category,
                }
            }
        }
    }
}

/// Numeric status with inclusive bounds; a missing bound means no judgment.
pub fn classify_numeric(value: Decimal, min: Option<Decimal>, max: Option<Decimal>) -> Status {
    match (min, max) {
        (Some(min), Some(_)) if value < min => Status::Low,
        (Some(_), Some(max)) if value > max => Status::High,
        _ => Status::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::{Category, PatientContext, PatientGender, RangeCandidate, RangeGender};
    use rust_decimal_macros::dec;

    struct FixedRepository(Vec<RangeCandidate>);

    impl ReferenceRepository for FixedRepository {
        fn lookup(&self, _query: &ReferenceQuery) -> ResolverResult<Vec<RangeCandidate>> {
            Ok(self.0.clone())
        }
    }

    struct FailingRepository;

    impl ReferenceRepository for FailingRepository {
        fn lookup(&self, _query: &ReferenceQuery) -> ResolverResult<Vec<RangeCandidate>> {
            Err(DbError::InvalidData("offline".into()).into())
        }
    }

    fn patient() -> PatientContext {
        PatientContext::new(PatientGender::Male, Some(45))
    }

    #[test]
    fn test_numeric_classification() {
        assert_eq!(classify_numeric(dec!(79), Some(dec!(80)), Some(dec!(200))), Status::Low);
        assert_eq!(classify_numeric(dec!(80), Some(dec!(80)), Some(dec!(200))), Status::Normal);
        assert_eq!(classify_numeric(dec!(200), Some(dec!(80)), Some(dec!(200))), Status::Normal);
        assert_eq!(classify_numeric(dec!(201), Some(dec!(80)), Some(dec!(200))), Status::High);
    }

    #[test]
    fn test_incomplete_numeric_bounds_are_normal() {
        assert_eq!(classify_numeric(dec!(1), Some(dec!(80)), None), Status::Normal);
        assert_eq!(classify_numeric(dec!(900), None, Some(dec!(200))), Status::Normal);
        assert_eq!(classify_numeric(dec!(900), None, None), Status::Normal);
    }

    #[test]
    fn test_document_ranges_take_priority() {
        let repository = FixedRepository(vec![RangeCandidate::numeric(Some(dec!(1)), Some(dec!(2)))]);
        let classifier = ResultClassifier::with_repository(&repository);
        let patient = patient();
        let ranges = vec![RangeCandidate::numeric(Some(dec!(70)), Some(dec!(99)))];
        let request = ReferenceRequest::new("GLICOSE", &patient).document_ranges(&ranges);

        let classification = classifier
            .classify(&MeasuredValue::Numeric(dec!(85)), &request)
            .unwrap();

        assert_eq!(classification.result.status, Status::Normal);
        assert_eq!(classification.result.reference_min, Some(dec!(70)));
    }

    #[test]
    fn test_repository_fallback() {
        let repository = FixedRepository(vec![RangeCandidate::numeric(Some(dec!(70)), Some(dec!(99)))]);
        let classifier = ResultClassifier::with_repository(&repository);
        let patient = patient();
        let request = ReferenceRequest::new("GLICOSE", &patient).laboratory(1);

        let classification = classifier
            .classify(&MeasuredValue::Numeric(dec!(120)), &request)
            .unwrap();

        assert_eq!(classification.result.status, Status::High);
        assert_eq!(classification.reference.match_score, Some(2));
    }

    #[test]
    fn test_eliminated_document_ranges_do_not_fall_through() {
        let repository = FixedRepository(vec![RangeCandidate::numeric(Some(dec!(70)), Some(dec!(99)))]);
        let classifier = ResultClassifier::with_repository(&repository);
        let patient = patient();
        let ranges = vec![RangeCandidate::numeric(Some(dec!(1)), Some(dec!(2))).for_gender(RangeGender::Female)];
        let request = ReferenceRequest::new("GLICOSE", &patient).document_ranges(&ranges);

        let classification = classifier
            .classify(&MeasuredValue::Numeric(dec!(500)), &request)
            .unwrap();

        assert!(classification.reference.is_empty());
        assert_eq!(classification.result.status, Status::Normal);
    }

    #[test]
    fn test_rejected_document_ranges_do_not_fall_through() {
        let repository = FixedRepository(vec![RangeCandidate::numeric(Some(dec!(70)), Some(dec!(99)))]);
        let classifier = ResultClassifier::with_repository(&repository);
        let patient = patient();
        // The report printed one range, which extraction then rejected
        let request = ReferenceRequest::new("GLICOSE", &patient).printed_ranges(1);

        let classification = classifier
            .classify(&MeasuredValue::Numeric(dec!(500)), &request)
            .unwrap();

        assert!(classification.reference.is_empty());
        assert_eq!(classification.result, ClassificationResult::normal());
    }

    #[test]
    fn test_no_sources_with_candidates() {
        let classifier = ResultClassifier::new();
        let patient = patient();
        let request = ReferenceRequest::new("HB", &patient);

        let classification = classifier
            .classify(&MeasuredValue::Numeric(dec!(3)), &request)
            .unwrap();

        assert!(classification.reference.is_empty());
        assert_eq!(classification.result, ClassificationResult::normal());
    }

    #[test]
    fn test_repository_error_propagates() {
        let classifier = ResultClassifier::with_repository(&FailingRepository);
        let patient = patient();
        let request = ReferenceRequest::new("HB", &patient);

        let result = classifier.classify(&MeasuredValue::Numeric(dec!(3)), &request);
        assert!(matches!(result, Err(ResolverError::Database(_))));
    }

    #[test]
    fn test_text_value_is_normal() {
        let classifier = ResultClassifier::new();
        let reference = ResolvedReference::from_candidate(
            &RangeCandidate::numeric(Some(dec!(1)), Some(dec!(2))),
            2,
        );

        let result = classifier.classify_against(&MeasuredValue::Text("Reagente".into()), &reference);
        assert_eq!(result.status, Status::Normal);
    }

    #[test]
    fn test_categorical_bounds_replace_reference_bounds() {
        let classifier = ResultClassifier::new();
        let reference = ResolvedReference::from_candidate(
            &RangeCandidate::categorical(vec![
                Category::new("Deficiente", None, Some(dec!(20))),
                Category::new("Insuficiente", Some(dec!(20)), Some(dec!(30))),
                Category::new("Adequado", Some(dec!(30)), Some(dec!(100))),
                Category::new("Risco de intoxicação", Some(dec!(100)), None),
            ]),
            2,
        );

        let result = classifier.classify_against(&MeasuredValue::Numeric(dec!(25)), &reference);
        assert_eq!(result.status, Status::Low);
        assert_eq!(result.reference_min, Some(dec!(20)));
        assert_eq!(result.reference_max, Some(dec!(30)));
        assert_eq!(result.matched_category.as_deref(), Some("Insuficiente"));

        let result = classifier.classify_against(&MeasuredValue::Numeric(dec!(150)), &reference);
        assert_eq!(result.status, Status::Critical);
        assert_eq!(result.reference_max, None);
    }

    #[test]
    fn test_custom_source_chain() {
        let classifier = ResultClassifier::with_sources(vec![]);
        assert!(classifier.source_names().is_empty());

        let repository = FixedRepository(vec![]);
        let classifier = ResultClassifier::with_repository(&repository);
        assert_eq!(classifier.source_names(), vec!["document", "standard"]);
    }
}
