use super::model::{AgeGroup, Observation, Sex, TransitionDataset};
use crate::series::selection::SelectorState;

// ---------------------------------------------------------------------------
// Row filter: sex ∈ selected AND age_group ∈ selected
// ---------------------------------------------------------------------------

/// An observation that passed the selector filter, tagged with its
/// colour/grouping key.
#[derive(Debug, Clone)]
pub struct FilteredRow<'a> {
    pub observation: &'a Observation,
    /// `sex + "_" + age_group`, e.g. `f_16-64`.
    pub sex_age: String,
}

/// Grouping key for a `(sex, age_group)` cell.
pub fn sex_age_key(sex: Sex, age_group: AgeGroup) -> String {
    format!("{}_{}", sex.code(), age_group.label())
}

/// Return the observations matching the selected sexes and age groups, in
/// dataset (date) order.
///
/// An empty sex or age-group selection matches nothing.
pub fn filter_rows<'a>(dataset: &'a TransitionDataset, selection: &SelectorState) -> Vec<FilteredRow<'a>> {
    if selection.sexes.is_empty() || selection.age_groups.is_empty() {
        return Vec::new();
    }
    dataset
        .observations
        .iter()
        .filter(|obs| selection.sexes.contains(&obs.sex) && selection.age_groups.contains(&obs.age_group))
        .map(|obs| FilteredRow {
            observation: obs,
            sex_age: sex_age_key(obs.sex, obs.age_group),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Datelike, NaiveDate};

    use super::*;

    fn dataset() -> TransitionDataset {
        let mut observations = Vec::new();
        for month in 1..=3 {
            for sex in Sex::ALL {
                for age_group in [AgeGroup::Age16To64, AgeGroup::Age20To24] {
                    observations.push(Observation {
                        date: NaiveDate::from_ymd_opt(1990, month, 12).unwrap(),
                        sex,
                        age_group,
                        values: vec![month as f64],
                    });
                }
            }
        }
        TransitionDataset::from_observations(observations, vec!["rate_EfEp".to_string()])
    }

    #[test]
    fn keeps_matching_rows_with_key() {
        let ds = dataset();
        let sel = SelectorState {
            sexes: BTreeSet::from([Sex::Female]),
            ..SelectorState::default()
        };
        let rows = filter_rows(&ds, &sel);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.sex_age == "f_16-64"));
        let months: Vec<u32> = rows.iter().map(|r| r.observation.date.month()).collect();
        assert_eq!(months, vec![1, 2, 3]);
    }

    #[test]
    fn empty_sexes_or_ages_match_nothing() {
        let ds = dataset();
        let mut sel = SelectorState::default();
        sel.sexes.clear();
        assert!(filter_rows(&ds, &sel).is_empty());

        let mut sel = SelectorState::default();
        sel.age_groups.clear();
        assert!(filter_rows(&ds, &sel).is_empty());
    }

    #[test]
    fn enlarging_selection_never_shrinks_result() {
        let ds = dataset();
        let small = SelectorState {
            sexes: BTreeSet::from([Sex::Male]),
            age_groups: BTreeSet::from([AgeGroup::Age20To24]),
            ..SelectorState::default()
        };
        let mut larger = small.clone();
        larger.sexes.insert(Sex::Total);
        let mut largest = larger.clone();
        largest.age_groups.insert(AgeGroup::Age16To64);

        let counts: Vec<usize> = [&small, &larger, &largest]
            .iter()
            .map(|sel| filter_rows(&ds, sel).len())
            .collect();
        assert_eq!(counts, vec![3, 6, 12]);
    }
}
