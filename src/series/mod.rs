/// Selection → series pipeline.
///
/// ```text
///   SelectorState
///        │
///        ▼
///   ┌─────────┐
///   │ resolve  │  codes × flow mode × seasonal → value columns
///   └─────────┘
///        │            dataset
///        ▼               │
///   ┌──────────────┐     │
///   │ data::filter  │◄────┘  sex / age predicates → rows + sex_age
///   └──────────────┘
///        │
///        ▼
///   ┌─────────┐
///   │ reshape  │  project, or union gross + instantaneous (Both)
///   └─────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ assemble  │  line series + recession bands
///   └──────────┘
/// ```
pub mod assemble;
pub mod reshape;
pub mod resolve;
pub mod selection;

use crate::data::filter::filter_rows;
use crate::data::model::TransitionDataset;
use crate::error::FlowError;

use assemble::{assemble, ChartSpec};
use selection::SelectorState;

/// Derive the chart for `selection` from scratch. Pure: the dataset is only
/// read, and nothing is cached between calls.
pub fn recompute(dataset: &TransitionDataset, selection: &SelectorState) -> Result<ChartSpec, FlowError> {
    let columns = resolve::resolve(&dataset.catalog, selection)?;
    let rows = filter_rows(dataset, selection);
    let table = reshape::shape(&rows, &columns, selection.flow_mode)?;
    log::debug!(
        "recompute: {} columns, {} filtered rows, {} render rows",
        columns.len(),
        rows.len(),
        table.len()
    );
    Ok(assemble(&table, selection))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use super::assemble::StrokeStyle;
    use super::selection::FlowMode;
    use super::*;
    use crate::data::filter::filter_rows;
    use crate::data::model::{canonical_columns, AgeGroup, FlowKind, Observation, Sex, TransitionCode};

    /// Two years of monthly rows for every sex and two age groups, all 64
    /// value columns filled with distinct numbers.
    fn dataset() -> TransitionDataset {
        let columns = canonical_columns();
        let mut observations = Vec::new();
        for year in 2000..2002 {
            for month in 1..=12 {
                for sex in Sex::ALL {
                    for age_group in [AgeGroup::Age16To64, AgeGroup::Age25To29] {
                        let values = (0..columns.len()).map(|i| i as f64 + month as f64 / 100.0).collect();
                        observations.push(Observation {
                            date: NaiveDate::from_ymd_opt(year, month, 12).unwrap(),
                            sex,
                            age_group,
                            values,
                        });
                    }
                }
            }
        }
        TransitionDataset::from_observations(observations, columns)
    }

    fn scenario(seasonal: bool, flow_mode: FlowMode) -> SelectorState {
        SelectorState::from_labels(&["f"], &["16-64"], &["EfEp"], seasonal, flow_mode).unwrap()
    }

    #[test]
    fn gross_selection_yields_one_series() {
        let ds = dataset();
        let chart = recompute(&ds, &scenario(false, FlowMode::Gross)).unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].key, "f_16-64");
        assert_eq!(chart.series[0].column, "rate_EfEp");
        assert_eq!(chart.series[0].points.len(), 24);
    }

    #[test]
    fn seasonal_gross_selection_reads_sa_column() {
        let ds = dataset();
        let chart = recompute(&ds, &scenario(true, FlowMode::Gross)).unwrap();
        assert_eq!(chart.series[0].column, "rate_EfEp_sa");
        let idx = ds.value_columns.iter().position(|c| c == "rate_EfEp_sa").unwrap();
        assert_eq!(chart.series[0].points[0].1, idx as f64 + 0.01);
    }

    #[test]
    fn both_mode_doubles_rows_and_orders_gross_first() {
        let ds = dataset();
        let sel = scenario(true, FlowMode::Both);

        let columns = resolve::resolve(&ds.catalog, &sel).unwrap();
        let rows = filter_rows(&ds, &sel);
        let table = reshape::shape(&rows, &columns, sel.flow_mode).unwrap();
        assert_eq!(table.len(), 2 * rows.len());

        let chart = recompute(&ds, &sel).unwrap();
        let order: Vec<(FlowKind, StrokeStyle)> = chart.series.iter().map(|s| (s.kind, s.stroke)).collect();
        assert_eq!(
            order,
            vec![
                (FlowKind::Gross, StrokeStyle::Dashed),
                (FlowKind::Instantaneous, StrokeStyle::Solid)
            ]
        );
        // gross values were relabelled but still come from rate_EfEp_sa
        let gross_idx = ds.value_columns.iter().position(|c| c == "rate_EfEp_sa").unwrap();
        assert_eq!(chart.series[0].points[0].1, gross_idx as f64 + 0.01);
        assert_eq!(chart.series[0].column, "EfEp_sa");
    }

    #[test]
    fn nothing_selected_renders_only_bands() {
        let ds = dataset();
        let mut sel = scenario(false, FlowMode::Gross);
        sel.sexes = BTreeSet::new();
        assert!(filter_rows(&ds, &sel).is_empty());
        let chart = recompute(&ds, &sel).unwrap();
        assert!(chart.series.is_empty());
        assert_eq!(chart.bands.len(), 4);
    }

    #[test]
    fn bands_do_not_depend_on_selection() {
        let ds = dataset();
        let a = recompute(&ds, &scenario(false, FlowMode::Gross)).unwrap();
        let mut sel = scenario(true, FlowMode::Both);
        sel.transition_codes = TransitionCode::ALL.into_iter().collect();
        let b = recompute(&ds, &sel).unwrap();
        assert_eq!(a.bands, b.bands);
        assert_eq!(b.series.len(), 32);
    }

    #[test]
    fn missing_column_aborts_recompute() {
        let mut ds = dataset();
        ds.catalog = crate::data::model::SeriesCatalog::from_columns(&["rate_EfEp".to_string()]);
        let err = recompute(&ds, &scenario(true, FlowMode::Gross)).unwrap_err();
        assert_eq!(err, FlowError::UnknownSeries("rate_EfEp_sa".to_string()));
    }
}
