use crate::data::model::{FlowKind, SeriesCatalog, SeriesKey, TransitionCode};
use crate::error::FlowError;

use super::selection::SelectorState;

/// A concrete value column together with its semantic tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub code: TransitionCode,
    pub kind: FlowKind,
    /// Column name in the dataset, seasonal suffix included.
    pub column: String,
    /// Position in [`crate::data::model::TransitionDataset::value_columns`].
    pub index: usize,
}

/// Map the selection to the value columns it needs.
///
/// Columns are grouped by kind, gross first, and ordered by transition code
/// within each group. No codes selected yields an empty list.
pub fn resolve(catalog: &SeriesCatalog, selection: &SelectorState) -> Result<Vec<ResolvedColumn>, FlowError> {
    let mut columns = Vec::new();
    for &kind in selection.flow_mode.kinds() {
        for &code in &selection.transition_codes {
            let key = SeriesKey::new(code, kind, selection.seasonal);
            let index = catalog.lookup(&key)?;
            columns.push(ResolvedColumn {
                code,
                kind,
                column: key.column_name(),
                index,
            });
        }
    }
    Ok(columns)
}
