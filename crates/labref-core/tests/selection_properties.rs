//! Property tests for range selection.

use labref_core::models::{PatientContext, PatientGender, RangeCandidate, RangeGender};
use labref_core::resolver::RangeSelector;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn range_gender() -> impl Strategy<Value = RangeGender> {
    prop_oneof![
        Just(RangeGender::Male),
        Just(RangeGender::Female),
        Just(RangeGender::Both),
    ]
}

fn patient_gender() -> impl Strategy<Value = PatientGender> {
    prop_oneof![
        Just(PatientGender::Male),
        Just(PatientGender::Female),
        Just(PatientGender::Other),
        Just(PatientGender::Unknown),
    ]
}

fn candidate() -> impl Strategy<Value = RangeCandidate> {
    (
        range_gender(),
        proptest::option::of(0u32..100),
        proptest::option::of(0u32..100),
        0i64..1000,
    )
        .prop_map(|(gender, age_min, age_max, marker)| {
            RangeCandidate::numeric(Some(Decimal::from(marker)), None)
                .for_gender(gender)
                .for_ages(age_min, age_max)
        })
}

proptest! {
    #[test]
    fn selected_gender_is_compatible(
        candidates in proptest::collection::vec(candidate(), 0..8),
        gender in patient_gender(),
        age in proptest::option::of(0u32..100),
    ) {
        let patient = PatientContext::new(gender, age);
        let selected = RangeSelector::new().select(&candidates, &patient);

        if let Some(range_gender) = selected.gender {
            let compatible = match range_gender {
                RangeGender::Both => true,
                RangeGender::Male => gender == PatientGender::Male,
                RangeGender::Female => gender == PatientGender::Female,
            };
            prop_assert!(compatible);
        }
    }

    #[test]
    fn unknown_age_only_selects_age_wildcards(
        candidates in proptest::collection::vec(candidate(), 0..8),
        gender in patient_gender(),
    ) {
        let patient = PatientContext::new(gender, None);
        let selected = RangeSelector::new().select(&candidates, &patient);

        prop_assert!(selected.age_min.is_none());
        prop_assert!(selected.age_max.is_none());
    }

    #[test]
    fn selected_age_bounds_cover_patient(
        candidates in proptest::collection::vec(candidate(), 0..8),
        gender in patient_gender(),
        age in 0u32..100,
    ) {
        let patient = PatientContext::new(gender, Some(age));
        let selected = RangeSelector::new().select(&candidates, &patient);

        if !selected.is_empty() {
            prop_assert!(selected.age_min.map_or(true, |min| age >= min));
            prop_assert!(selected.age_max.map_or(true, |max| age <= max));
        }
    }

    #[test]
    fn winner_is_first_of_the_best_score(
        candidates in proptest::collection::vec(candidate(), 1..8),
        gender in patient_gender(),
        age in proptest::option::of(0u32..100),
    ) {
        let selector = RangeSelector::new();
        let patient = PatientContext::new(gender, age);
        let selected = selector.select(&candidates, &patient);

        let best = candidates
            .iter()
            .filter_map(|c| selector.score(c, &patient).ok().map(|s| (c, s.total())))
            .fold(None, |best: Option<(&RangeCandidate, u32)>, (c, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((c, score)),
            });

        match best {
            Some((candidate, score)) => {
                prop_assert_eq!(selected.match_score, Some(score));
                prop_assert_eq!(&selected.kind, &candidate.kind);
            }
            None => prop_assert!(selected.is_empty()),
        }
    }

    #[test]
    fn selection_is_deterministic(
        candidates in proptest::collection::vec(candidate(), 0..8),
        gender in patient_gender(),
        age in proptest::option::of(0u32..100),
    ) {
        let selector = RangeSelector::new();
        let patient = PatientContext::new(gender, age);

        prop_assert_eq!(
            selector.select(&candidates, &patient),
            selector.select(&candidates, &patient)
        );
    }
}
