use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::series::selection::SelectorState;

// ---------------------------------------------------------------------------
// Static configuration
// ---------------------------------------------------------------------------

pub const CHART_TITLE: &str = "Labor Market Transitions";

/// Earlier years have missing months and are dropped at load time.
pub const MIN_YEAR: i32 = 1988;

/// Day of month assigned to every monthly observation.
pub const OBSERVATION_DAY: u32 = 12;

pub const DEFAULT_DATA_PATH: &str = "dta.csv";

/// Band fill: grey at this opacity.
pub const BAND_OPACITY: f32 = 0.3;

/// US recessions, `(start, end)` as `(year, month, day)`.
const RECESSION_PERIODS: [((i32, u32, u32), (i32, u32, u32)); 4] = [
    ((1990, 7, 1), (1991, 3, 1)),
    ((2001, 3, 1), (2001, 11, 1)),
    ((2007, 12, 1), (2009, 6, 1)),
    ((2020, 2, 1), (2020, 4, 1)),
];

/// A shaded background interval on the date axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecessionBand {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The fixed recession intervals, oldest first.
pub fn recession_bands() -> Vec<RecessionBand> {
    let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d);
    RECESSION_PERIODS
        .iter()
        .filter_map(|&(start, end)| {
            Some(RecessionBand {
                start: date(start)?,
                end: date(end)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

const ENV_DATA: &str = "LABOR_FLOWS_DATA";
const ENV_SEXES: &str = "LABOR_FLOWS_SEXES";
const ENV_AGES: &str = "LABOR_FLOWS_AGES";
const ENV_CODES: &str = "LABOR_FLOWS_CODES";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dataset opened at startup.
    pub data_path: PathBuf,
    /// Selector values shown on startup.
    pub initial_selection: SelectorState,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            initial_selection: SelectorState::default(),
        }
    }
}

impl AppConfig {
    /// Data path from the first CLI argument, then `LABOR_FLOWS_DATA`.
    /// `LABOR_FLOWS_SEXES`, `LABOR_FLOWS_AGES` and `LABOR_FLOWS_CODES` take
    /// comma-separated labels for the initial selection.
    pub fn from_env() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::from_sources(std::env::args().nth(1), lookup)
    }

    fn from_sources(arg: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = AppConfig::default();
        if let Some(path) = arg.or_else(|| lookup(ENV_DATA)) {
            config.data_path = PathBuf::from(path);
        }

        let defaults = SelectorState::default();
        let labels = |key: &str, fallback: Vec<String>| match lookup(key) {
            Some(raw) => split_labels(&raw),
            None => fallback,
        };
        let sexes = labels(ENV_SEXES, defaults.sexes.iter().map(|s| s.code().to_string()).collect());
        let ages = labels(ENV_AGES, defaults.age_groups.iter().map(|a| a.label().to_string()).collect());
        let codes = labels(
            ENV_CODES,
            defaults.transition_codes.iter().map(|c| c.code().to_string()).collect(),
        );

        match SelectorState::from_labels(
            sexes.as_slice(),
            ages.as_slice(),
            codes.as_slice(),
            defaults.seasonal,
            defaults.flow_mode,
        ) {
            Ok(selection) => config.initial_selection = selection,
            Err(e) => log::warn!("Ignoring initial selection override: {e}"),
        }
        config
    }
}

fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
