use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::model::{AgeGroup, FlowKind, Sex, TransitionCode};
use crate::error::FlowError;

/// Which transition-rate family (or both) to plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    Gross,
    Instantaneous,
    Both,
}

impl FlowMode {
    pub const ALL: [FlowMode; 3] = [FlowMode::Gross, FlowMode::Instantaneous, FlowMode::Both];

    pub fn label(self) -> &'static str {
        match self {
            FlowMode::Gross => "gross transition rate",
            FlowMode::Instantaneous => "instantaneous transition rate",
            FlowMode::Both => "both (gross = dashed)",
        }
    }

    /// Flow kinds plotted in this mode, gross first.
    pub fn kinds(self) -> &'static [FlowKind] {
        match self {
            FlowMode::Gross => &[FlowKind::Gross],
            FlowMode::Instantaneous => &[FlowKind::Instantaneous],
            FlowMode::Both => &[FlowKind::Gross, FlowKind::Instantaneous],
        }
    }
}

/// Current value of every chart selector. Empty sets are legal and select
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorState {
    pub sexes: BTreeSet<Sex>,
    pub age_groups: BTreeSet<AgeGroup>,
    pub transition_codes: BTreeSet<TransitionCode>,
    pub seasonal: bool,
    pub flow_mode: FlowMode,
}

impl Default for SelectorState {
    fn default() -> Self {
        Self {
            sexes: Sex::ALL.into_iter().collect(),
            age_groups: BTreeSet::from([AgeGroup::Age16To64]),
            transition_codes: BTreeSet::from([TransitionCode::EfEp]),
            seasonal: false,
            flow_mode: FlowMode::Gross,
        }
    }
}

impl SelectorState {
    /// Build a selection from text labels as they appear in the data file.
    pub fn from_labels<S: AsRef<str>>(
        sexes: &[S],
        age_groups: &[S],
        transition_codes: &[S],
        seasonal: bool,
        flow_mode: FlowMode,
    ) -> Result<Self, FlowError> {
        Ok(Self {
            sexes: parse_all(sexes)?,
            age_groups: parse_all(age_groups)?,
            transition_codes: parse_all(transition_codes)?,
            seasonal,
            flow_mode,
        })
    }
}

fn parse_all<T, S>(labels: &[S]) -> Result<BTreeSet<T>, FlowError>
where
    T: std::str::FromStr<Err = FlowError> + Ord,
    S: AsRef<str>,
{
    labels.iter().map(|l| l.as_ref().trim().parse()).collect()
}
