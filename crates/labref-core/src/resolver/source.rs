//! Ordered reference sources.
//!
//! A classifier walks its sources in order and stops at the first one that yields
//! any candidates, or that claims the request even with none left. The default
//! chain is per-document ranges, then stored standard ranges.

use log::debug;

use super::ResolverResult;
use crate::models::{PatientContext, RangeCandidate};

/// Everything a source may need to produce candidates for one parameter.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRequest<'a> {
    pub parameter_code: &'a str,
    pub patient: &'a PatientContext,
    /// Laboratory that issued the report, if known
    pub laboratory_id: Option<i64>,
    /// Candidates extracted from the document itself (may be empty)
    pub document_ranges: &'a [RangeCandidate],
    /// Ranges the document printed, counting ones rejected during extraction
    pub printed_ranges: usize,
}

impl<'a> ReferenceRequest<'a> {
    pub fn new(parameter_code: &'a str, patient: &'a PatientContext) -> Self {
        Self {
            parameter_code,
            patient,
            laboratory_id: None,
            document_ranges: &[],
            printed_ranges: 0,
        }
    }

    pub fn laboratory(mut self, laboratory_id: i64) -> Self {
        self.laboratory_id = Some(laboratory_id);
        self
    }

    pub fn document_ranges(mut self, ranges: &'a [RangeCandidate]) -> Self {
        self.document_ranges = ranges;
        self.printed_ranges = self.printed_ranges.max(ranges.len());
        self
    }

    /// Record how many ranges the document printed before validation.
    pub fn printed_ranges(mut self, count: usize) -> Self {
        self.printed_ranges = count.max(self.document_ranges.len());
        self
    }
}

/// Query sent to a [`ReferenceRepository`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceQuery {
    pub parameter_code: String,
    pub patient: PatientContext,
    pub laboratory_id: Option<i64>,
}

/// Persisted standard reference ranges.
///
/// Implementations return laboratory-specific rows before laboratory-agnostic
/// ones; the selector's first-listed tie-break relies on that order.
pub trait ReferenceRepository {
    fn lookup(&self, query: &ReferenceQuery) -> ResolverResult<Vec<RangeCandidate>>;
}

/// One stage of the fallback chain.
pub trait ReferenceSource {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Candidates for the request; an empty list passes to the next source
    /// unless [`claims`](Self::claims) holds.
    fn candidates(&self, request: &ReferenceRequest<'_>) -> ResolverResult<Vec<RangeCandidate>>;

    /// Whether this source decides the request even when it has no usable candidates.
    fn claims(&self, _request: &ReferenceRequest<'_>) -> bool {
        false
    }
}

/// Ranges printed on the report and extracted alongside the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRanges;

impl ReferenceSource for DocumentRanges {
    fn name(&self) -> &'static str {
        "document"
    }

    fn candidates(&self, request: &ReferenceRequest<'_>) -> ResolverResult<Vec<RangeCandidate>> {
        Ok(request.document_ranges.to_vec())
    }

    /// A report that printed any range owns the reference, usable or not.
    fn claims(&self, request: &ReferenceRequest<'_>) -> bool {
        request.printed_ranges > 0
    }
}

/// Standard ranges from a repository, scoped to the parameter, patient and laboratory.
pub struct StandardRanges<'r> {
    repository: &'r dyn ReferenceRepository,
}

impl<'r> StandardRanges<'r> {
    pub fn new(repository: &'r dyn ReferenceRepository) -> Self {
        Self { repository }
    }
}

impl ReferenceSource for StandardRanges<'_> {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn candidates(&self, request: &ReferenceRequest<'_>) -> ResolverResult<Vec<RangeCandidate>> {
        let query = ReferenceQuery {
            parameter_code: request.parameter_code.to_string(),
            patient: *request.patient,
            laboratory_id: request.laboratory_id,
        };
        let candidates = self.repository.lookup(&query)?;
        debug!(
            "Repository returned {} candidate(s) for {}",
            candidates.len(),
            request.parameter_code
        );
        Ok(candidates)
    }
}
