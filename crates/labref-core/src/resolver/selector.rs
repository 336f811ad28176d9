//! Reference range selection using elimination-then-score.
//!
//! Scoring:
//! - Gender: exact match 10, "both" wildcard 1, mismatch eliminates
//! - Age: inside [age_min, age_max] 10, no age bounds 1, outside or unknown age eliminates
//!
//! Highest total wins; equal totals keep input order (first listed wins).

use log::debug;

use crate::models::{PatientContext, PatientGender, RangeCandidate, RangeGender, ResolvedReference};

/// Score for a gender-specific candidate matching the patient.
pub const GENDER_EXACT_SCORE: u32 = 10;

/// Score for a candidate applying to both genders.
pub const GENDER_WILDCARD_SCORE: u32 = 1;

/// Score for an age-scoped candidate covering the patient's age.
pub const AGE_EXACT_SCORE: u32 = 10;

/// Score for a candidate with no age bounds.
pub const AGE_WILDCARD_SCORE: u32 = 1;

/// Why a candidate was disqualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elimination {
    /// Candidate is for the other gender (or the patient's gender is not male/female)
    GenderMismatch,
    /// Candidate is age-scoped but the patient's age is unknown
    AgeUnknown,
    /// Patient's age is outside the candidate's bounds
    AgeOutOfRange,
}

/// Breakdown of how a candidate was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub gender_score: u32,
    pub age_score: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.gender_score + self.age_score
    }
}

/// A surviving candidate with its position in the input and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRange<'a> {
    pub index: usize,
    pub candidate: &'a RangeCandidate,
    pub breakdown: ScoreBreakdown,
}

/// Picks the best-matching reference range for a patient.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeSelector;

impl RangeSelector {
    pub fn new() -> Self {
        Self
    }

    /// Select the best candidate, or the empty sentinel when none survives.
    pub fn select(&self, candidates: &[RangeCandidate], patient: &PatientContext) -> ResolvedReference {
        match self.rank(candidates, patient).into_iter().next() {
            Some(best) => {
                debug!(
                    "Selected candidate #{} (score {}: gender {}, age {}) of {}",
                    best.index,
                    best.breakdown.total(),
                    best.breakdown.gender_score,
                    best.breakdown.age_score,
                    candidates.len()
                );
                ResolvedReference::from_candidate(best.candidate, best.breakdown.total())
            }
            None => ResolvedReference::empty(),
        }
    }

    /// All surviving candidates, best first. Sorting is stable so ties keep input order.
    pub fn rank<'a>(&self, candidates: &'a [RangeCandidate], patient: &PatientContext) -> Vec<ScoredRange<'a>> {
        let mut scored: Vec<ScoredRange<'a>> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| match self.score(candidate, patient) {
                Ok(breakdown) => Some(ScoredRange {
                    index,
                    candidate,
                    breakdown,
                }),
                Err(reason) => {
                    debug!("Candidate #{} eliminated: {:?}", index, reason);
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.breakdown.total().cmp(&a.breakdown.total()));
        scored
    }

    /// Score one candidate, or report why it is disqualified.
    pub fn score(&self, candidate: &RangeCandidate, patient: &PatientContext) -> Result<ScoreBreakdown, Elimination> {
        Ok(ScoreBreakdown {
            gender_score: score_gender(candidate.gender, patient.gender)?,
            age_score: score_age(candidate, patient.age)?,
        })
    }
}

fn score_gender(range_gender: RangeGender, patient_gender: PatientGender) -> Result<u32, Elimination> {
    match (range_gender, patient_gender) {
        (RangeGender::Both, _) => Ok(GENDER_WILDCARD_SCORE),
        (RangeGender::Male, PatientGender::Male) | (RangeGender::Female, PatientGender::Female) => {
            Ok(GENDER_EXACT_SCORE)
        }
        _ => Err(Elimination::GenderMismatch),
    }
}

fn score_age(candidate: &RangeCandidate, age: Option<u32>) -> Result<u32, Elimination> {
    if candidate.is_age_wildcard() {
        return Ok(AGE_WILDCARD_SCORE);
    }
    match age {
        None => Err(Elimination::AgeUnknown),
        Some(age) if candidate.covers_age(age) => Ok(AGE_EXACT_SCORE),
        Some(_) => Err(Elimination::AgeOutOfRange),
    }
}
