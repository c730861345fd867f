use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::FlowError;

// ---------------------------------------------------------------------------
// Fixed vocabularies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Sex {
    #[serde(rename = "f")]
    Female,
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "t")]
    Total,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Female, Sex::Male, Sex::Total];

    /// One-letter code used in the data file and in the `sex_age` key.
    pub fn code(self) -> &'static str {
        match self {
            Sex::Female => "f",
            Sex::Male => "m",
            Sex::Total => "t",
        }
    }
}

impl FromStr for Sex {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sex::ALL
            .into_iter()
            .find(|sex| sex.code() == s)
            .ok_or_else(|| FlowError::UnknownSelectorValue {
                field: "sex",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "16-64")]
    Age16To64,
    #[serde(rename = "16-19")]
    Age16To19,
    #[serde(rename = "20-24")]
    Age20To24,
    #[serde(rename = "25-29")]
    Age25To29,
    #[serde(rename = "30-34")]
    Age30To34,
    #[serde(rename = "35-39")]
    Age35To39,
    #[serde(rename = "40-44")]
    Age40To44,
    #[serde(rename = "45-49")]
    Age45To49,
    #[serde(rename = "50-54")]
    Age50To54,
    #[serde(rename = "55-64")]
    Age55To64,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 10] = [
        AgeGroup::Age16To64,
        AgeGroup::Age16To19,
        AgeGroup::Age20To24,
        AgeGroup::Age25To29,
        AgeGroup::Age30To34,
        AgeGroup::Age35To39,
        AgeGroup::Age40To44,
        AgeGroup::Age45To49,
        AgeGroup::Age50To54,
        AgeGroup::Age55To64,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Age16To64 => "16-64",
            AgeGroup::Age16To19 => "16-19",
            AgeGroup::Age20To24 => "20-24",
            AgeGroup::Age25To29 => "25-29",
            AgeGroup::Age30To34 => "30-34",
            AgeGroup::Age35To39 => "35-39",
            AgeGroup::Age40To44 => "40-44",
            AgeGroup::Age45To49 => "45-49",
            AgeGroup::Age50To54 => "50-54",
            AgeGroup::Age55To64 => "55-64",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeGroup::ALL
            .into_iter()
            .find(|age| age.label() == s)
            .ok_or_else(|| FlowError::UnknownSelectorValue {
                field: "age group",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A month-to-month labor-market state transition.
///
/// States: `Ef` full-time, `Ep` part-time, `U` unemployed, `N` out of the
/// labor force. The variant name is the code used in column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TransitionCode {
    EfEf,
    EfEp,
    EfU,
    EfN,
    EpEf,
    EpEp,
    EpU,
    EpN,
    UEf,
    UEp,
    UU,
    UN,
    NEf,
    NEp,
    NU,
    NN,
}

impl TransitionCode {
    pub const ALL: [TransitionCode; 16] = [
        TransitionCode::EfEf,
        TransitionCode::EfEp,
        TransitionCode::EfU,
        TransitionCode::EfN,
        TransitionCode::EpEf,
        TransitionCode::EpEp,
        TransitionCode::EpU,
        TransitionCode::EpN,
        TransitionCode::UEf,
        TransitionCode::UEp,
        TransitionCode::UU,
        TransitionCode::UN,
        TransitionCode::NEf,
        TransitionCode::NEp,
        TransitionCode::NU,
        TransitionCode::NN,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TransitionCode::EfEf => "EfEf",
            TransitionCode::EfEp => "EfEp",
            TransitionCode::EfU => "EfU",
            TransitionCode::EfN => "EfN",
            TransitionCode::EpEf => "EpEf",
            TransitionCode::EpEp => "EpEp",
            TransitionCode::EpU => "EpU",
            TransitionCode::EpN => "EpN",
            TransitionCode::UEf => "UEf",
            TransitionCode::UEp => "UEp",
            TransitionCode::UU => "UU",
            TransitionCode::UN => "UN",
            TransitionCode::NEf => "NEf",
            TransitionCode::NEp => "NEp",
            TransitionCode::NU => "NU",
            TransitionCode::NN => "NN",
        }
    }

    /// Human-readable label, e.g. `full-time --> part-time`.
    pub fn label(self) -> String {
        let (from, to) = self.states();
        format!("{from} --> {to}")
    }

    fn states(self) -> (&'static str, &'static str) {
        const EF: &str = "full-time";
        const EP: &str = "part-time";
        const U: &str = "unemployed";
        const N: &str = "out of labor force";
        match self {
            TransitionCode::EfEf => (EF, EF),
            TransitionCode::EfEp => (EF, EP),
            TransitionCode::EfU => (EF, U),
            TransitionCode::EfN => (EF, N),
            TransitionCode::EpEf => (EP, EF),
            TransitionCode::EpEp => (EP, EP),
            TransitionCode::EpU => (EP, U),
            TransitionCode::EpN => (EP, N),
            TransitionCode::UEf => (U, EF),
            TransitionCode::UEp => (U, EP),
            TransitionCode::UU => (U, U),
            TransitionCode::UN => (U, N),
            TransitionCode::NEf => (N, EF),
            TransitionCode::NEp => (N, EP),
            TransitionCode::NU => (N, U),
            TransitionCode::NN => (N, N),
        }
    }
}

impl FromStr for TransitionCode {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransitionCode::ALL
            .into_iter()
            .find(|code| code.code() == s)
            .ok_or_else(|| FlowError::UnknownSeries(s.to_string()))
    }
}

impl fmt::Display for TransitionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Gross (observed) vs. instantaneous (continuous-time adjusted) rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Gross,
    Instantaneous,
}

impl FlowKind {
    pub fn label(self) -> &'static str {
        match self {
            FlowKind::Gross => "gross",
            FlowKind::Instantaneous => "instantaneous",
        }
    }
}

// ---------------------------------------------------------------------------
// SeriesKey / SeriesCatalog – typed column lookup
// ---------------------------------------------------------------------------

const GROSS_PREFIX: &str = "rate_";
const SEASONAL_SUFFIX: &str = "_sa";

/// Identifies one value column: `C`, `C_sa`, `rate_C` or `rate_C_sa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub code: TransitionCode,
    pub kind: FlowKind,
    pub seasonal: bool,
}

impl SeriesKey {
    pub fn new(code: TransitionCode, kind: FlowKind, seasonal: bool) -> Self {
        Self {
            code,
            kind,
            seasonal,
        }
    }

    /// Column name under the dataset's naming convention.
    pub fn column_name(&self) -> String {
        let prefix = match self.kind {
            FlowKind::Gross => GROSS_PREFIX,
            FlowKind::Instantaneous => "",
        };
        let suffix = if self.seasonal { SEASONAL_SUFFIX } else { "" };
        format!("{prefix}{}{suffix}", self.code.code())
    }

    /// Inverse of [`SeriesKey::column_name`]; `None` for unrelated columns.
    pub fn parse_column(name: &str) -> Option<Self> {
        let (kind, rest) = match name.strip_prefix(GROSS_PREFIX) {
            Some(rest) => (FlowKind::Gross, rest),
            None => (FlowKind::Instantaneous, name),
        };
        let (seasonal, code) = match rest.strip_suffix(SEASONAL_SUFFIX) {
            Some(code) => (true, code),
            None => (false, rest),
        };
        let code = code.parse().ok()?;
        Some(Self::new(code, kind, seasonal))
    }
}

/// Lookup table `SeriesKey → value-column index`, built once per dataset.
#[derive(Debug, Clone, Default)]
pub struct SeriesCatalog {
    index: BTreeMap<SeriesKey, usize>,
}

impl SeriesCatalog {
    /// Build the catalog from the dataset's value-column names.
    pub fn from_columns(columns: &[String]) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .filter_map(|(i, name)| SeriesKey::parse_column(name).map(|key| (key, i)))
            .collect();
        SeriesCatalog { index }
    }

    /// Column index for a key, or `UnknownSeries` naming the missing column.
    pub fn lookup(&self, key: &SeriesKey) -> Result<usize, FlowError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| FlowError::UnknownSeries(key.column_name()))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.index.contains_key(key)
    }
}

/// All 64 value-column names: per code `C`, `C_sa`, `rate_C`, `rate_C_sa`.
pub fn canonical_columns() -> Vec<String> {
    TransitionCode::ALL
        .into_iter()
        .flat_map(|code| {
            [
                SeriesKey::new(code, FlowKind::Instantaneous, false),
                SeriesKey::new(code, FlowKind::Instantaneous, true),
                SeriesKey::new(code, FlowKind::Gross, false),
                SeriesKey::new(code, FlowKind::Gross, true),
            ]
        })
        .map(|key| key.column_name())
        .collect()
}

// ---------------------------------------------------------------------------
// Observation – one row of the table
// ---------------------------------------------------------------------------

/// Monthly observation for one `(sex, age_group)` cell.
#[derive(Debug, Clone)]
pub struct Observation {
    /// `(year, month)` at a fixed mid-month day.
    pub date: NaiveDate,
    pub sex: Sex,
    pub age_group: AgeGroup,
    /// Aligned with [`TransitionDataset::value_columns`]; missing cells are NaN.
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// TransitionDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The cleaned, date-sorted table. Read-only once built.
#[derive(Debug, Clone)]
pub struct TransitionDataset {
    pub observations: Vec<Observation>,
    pub value_columns: Vec<String>,
    pub catalog: SeriesCatalog,
}

impl TransitionDataset {
    /// Build the dataset and its series catalog. Observations are stably
    /// sorted by date so rows sharing a date keep their input order.
    pub fn from_observations(mut observations: Vec<Observation>, value_columns: Vec<String>) -> Self {
        observations.sort_by_key(|obs| obs.date);
        let catalog = SeriesCatalog::from_columns(&value_columns);
        TransitionDataset {
            observations,
            value_columns,
            catalog,
        }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Canonical series the file did not provide.
    pub fn missing_series(&self) -> Vec<String> {
        canonical_columns()
            .into_iter()
            .filter(|name| {
                SeriesKey::parse_column(name)
                    .map_or(true, |key| !self.catalog.contains(&key))
            })
            .collect()
    }

    /// First and last observation dates.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.observations.first()?.date, self.observations.last()?.date))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn column_names_follow_convention() {
        let code = TransitionCode::EfEp;
        assert_eq!(SeriesKey::new(code, FlowKind::Instantaneous, false).column_name(), "EfEp");
        assert_eq!(SeriesKey::new(code, FlowKind::Instantaneous, true).column_name(), "EfEp_sa");
        assert_eq!(SeriesKey::new(code, FlowKind::Gross, false).column_name(), "rate_EfEp");
        assert_eq!(SeriesKey::new(code, FlowKind::Gross, true).column_name(), "rate_EfEp_sa");
    }

    #[test]
    fn parse_column_inverts_column_name() {
        for name in canonical_columns() {
            let key = SeriesKey::parse_column(&name).unwrap();
            assert_eq!(key.column_name(), name);
        }
        assert_eq!(SeriesKey::parse_column("year"), None);
        assert_eq!(SeriesKey::parse_column("rate_XY"), None);
    }

    #[test]
    fn canonical_catalog_has_four_columns_per_code() {
        assert_eq!(SeriesCatalog::from_columns(&canonical_columns()).len(), 64);
    }

    #[test]
    fn missing_series_lists_absent_columns() {
        let ds = TransitionDataset::from_observations(vec![], canonical_columns()[..60].to_vec());
        assert_eq!(ds.missing_series(), vec!["NN", "NN_sa", "rate_NN", "rate_NN_sa"]);
        assert!(ds.date_span().is_none());
    }

    #[test]
    fn lookup_miss_names_the_missing_column() {
        let catalog = SeriesCatalog::from_columns(&["rate_UU".to_string()]);
        assert_eq!(
            catalog.lookup(&SeriesKey::new(TransitionCode::UU, FlowKind::Gross, false)),
            Ok(0)
        );
        assert_eq!(
            catalog.lookup(&SeriesKey::new(TransitionCode::UU, FlowKind::Gross, true)),
            Err(FlowError::UnknownSeries("rate_UU_sa".to_string()))
        );
    }

    #[test]
    fn vocabularies_parse_and_reject() {
        assert_eq!("NEf".parse::<TransitionCode>(), Ok(TransitionCode::NEf));
        assert_eq!(
            "XX".parse::<TransitionCode>(),
            Err(FlowError::UnknownSeries("XX".to_string()))
        );
        assert_eq!("t".parse::<Sex>(), Ok(Sex::Total));
        assert!("x".parse::<Sex>().is_err());
        assert_eq!("55-64".parse::<AgeGroup>(), Ok(AgeGroup::Age55To64));
        assert!(matches!(
            "65+".parse::<AgeGroup>(),
            Err(FlowError::UnknownSelectorValue { field: "age group", .. })
        ));
    }

    #[test]
    fn transition_labels() {
        assert_eq!(TransitionCode::EfEp.label(), "full-time --> part-time");
        assert_eq!(TransitionCode::NU.label(), "out of labor force --> unemployed");
    }

    #[test]
    fn dataset_sorts_by_date_stably() {
        let obs = |year, month, sex| Observation {
            date: NaiveDate::from_ymd_opt(year, month, 12).unwrap(),
            sex,
            age_group: AgeGroup::Age16To64,
            values: vec![],
        };
        let ds = TransitionDataset::from_observations(
            vec![obs(1990, 2, Sex::Female), obs(1989, 5, Sex::Male), obs(1990, 2, Sex::Male)],
            vec![],
        );
        let order: Vec<_> = ds.observations.iter().map(|o| (o.date.year(), o.sex)).collect();
        assert_eq!(
            order,
            vec![(1989, Sex::Male), (1990, Sex::Female), (1990, Sex::Male)]
        );
    }
}
