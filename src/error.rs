use thiserror::Error;

/// Failures of the selection → series pipeline.
///
/// An empty selection is *not* an error: it resolves to no columns or no rows
/// and renders as an empty chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The selection names a series the dataset does not carry: either a
    /// transition code outside the fixed vocabulary, or a column missing from
    /// the loaded file.
    #[error("unknown series '{0}'")]
    UnknownSeries(String),

    /// A sex or age-group label outside the fixed vocabulary.
    #[error("unknown {field} '{value}'")]
    UnknownSelectorValue { field: &'static str, value: String },

    /// Gross and instantaneous column lists are not aligned per transition code.
    #[error("gross columns {gross:?} do not align with instantaneous columns {instantaneous:?}")]
    SchemaMismatch {
        gross: Vec<String>,
        instantaneous: Vec<String>,
    },
}
