use chrono::NaiveDate;

use crate::data::filter::FilteredRow;
use crate::data::model::{FlowKind, TransitionCode};
use crate::error::FlowError;

use super::resolve::ResolvedColumn;
use super::selection::FlowMode;

// ---------------------------------------------------------------------------
// Long-form render table
// ---------------------------------------------------------------------------

/// A value column of a [`RenderTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueColumn {
    pub code: TransitionCode,
    pub name: String,
}

/// One row handed to the chart assembler. Gross and instantaneous rows share
/// the identifying fields and differ only in `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRow {
    pub date: NaiveDate,
    pub sex_age: String,
    pub kind: FlowKind,
    /// Aligned with [`RenderTable::value_columns`].
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderTable {
    pub value_columns: Vec<ValueColumn>,
    pub rows: Vec<RenderRow>,
}

impl RenderTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// Projection and union
// ---------------------------------------------------------------------------

/// Project filtered rows onto `columns`, tagging every row with `kind`.
/// Value columns keep their dataset names.
pub fn project(rows: &[FilteredRow<'_>], columns: &[&ResolvedColumn], kind: FlowKind) -> RenderTable {
    let value_columns = columns
        .iter()
        .map(|c| ValueColumn {
            code: c.code,
            name: c.column.clone(),
        })
        .collect();
    let rows = rows
        .iter()
        .map(|row| RenderRow {
            date: row.observation.date,
            sex_age: row.sex_age.clone(),
            kind,
            values: columns
                .iter()
                .map(|c| row.observation.values.get(c.index).copied().unwrap_or(f64::NAN))
                .collect(),
        })
        .collect();
    RenderTable { value_columns, rows }
}

/// Union the gross and instantaneous projections of `rows` into one table.
///
/// The gross sub-table takes the instantaneous column names so both share a
/// schema; its rows come first. Output length is twice the input length.
pub fn reshape(rows: &[FilteredRow<'_>], columns: &[ResolvedColumn]) -> Result<RenderTable, FlowError> {
    let (gross, instant): (Vec<&ResolvedColumn>, Vec<&ResolvedColumn>) =
        columns.iter().partition(|c| c.kind == FlowKind::Gross);

    let aligned = gross.len() == instant.len() && gross.iter().zip(&instant).all(|(g, i)| g.code == i.code);
    if !aligned {
        return Err(FlowError::SchemaMismatch {
            gross: gross.iter().map(|c| c.column.clone()).collect(),
            instantaneous: instant.iter().map(|c| c.column.clone()).collect(),
        });
    }

    let gross_table = project(rows, &gross, FlowKind::Gross);
    let mut table = project(rows, &instant, FlowKind::Instantaneous);

    let instant_rows = std::mem::take(&mut table.rows);
    table.rows = gross_table.rows;
    table.rows.extend(instant_rows);
    Ok(table)
}

/// Shape filtered rows for the selected flow mode.
pub fn shape(rows: &[FilteredRow<'_>], columns: &[ResolvedColumn], mode: FlowMode) -> Result<RenderTable, FlowError> {
    match mode {
        FlowMode::Both => reshape(rows, columns),
        FlowMode::Gross | FlowMode::Instantaneous => {
            let kind = mode.kinds()[0];
            let columns: Vec<&ResolvedColumn> = columns.iter().collect();
            Ok(project(rows, &columns, kind))
        }
    }
}
