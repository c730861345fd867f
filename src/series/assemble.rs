use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{recession_bands, RecessionBand};
use crate::data::model::{FlowKind, TransitionCode};

use super::reshape::{RenderRow, RenderTable};
use super::selection::{FlowMode, SelectorState};

// ---------------------------------------------------------------------------
// Chart description handed to the renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    /// Unique legend key, e.g. `f_16-64` or `f_16-64, EfEp, gross`.
    pub key: String,
    /// Colour grouping key.
    pub sex_age: String,
    pub column: String,
    pub code: TransitionCode,
    pub kind: FlowKind,
    pub stroke: StrokeStyle,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Draw and legend order.
    pub series: Vec<LineSeries>,
    pub bands: Vec<RecessionBand>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Turn the shaped table into ordered line series plus recession bands.
///
/// Series are grouped by `sex_age` (first appearance) and then by value
/// column. In [`FlowMode::Both`] every dashed gross series precedes every
/// solid instantaneous series.
pub fn assemble(table: &RenderTable, selection: &SelectorState) -> ChartSpec {
    let mode = selection.flow_mode;
    let mut series = Vec::new();
    for &kind in mode.kinds() {
        let stroke = match (mode, kind) {
            (FlowMode::Both, FlowKind::Gross) => StrokeStyle::Dashed,
            _ => StrokeStyle::Solid,
        };
        series.extend(series_for_kind(table, kind, stroke, mode == FlowMode::Both));
    }
    ChartSpec {
        series,
        bands: recession_bands(),
    }
}

fn series_for_kind(table: &RenderTable, kind: FlowKind, stroke: StrokeStyle, tag_kind: bool) -> Vec<LineSeries> {
    let mut groups: Vec<(&str, Vec<&RenderRow>)> = Vec::new();
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    for row in table.rows.iter().filter(|r| r.kind == kind) {
        let idx = *group_of.entry(row.sex_age.as_str()).or_insert_with(|| {
            groups.push((row.sex_age.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(row);
    }

    let many_columns = table.value_columns.len() > 1;
    let mut out = Vec::with_capacity(groups.len() * table.value_columns.len());
    for (sex_age, rows) in &groups {
        for (col_idx, column) in table.value_columns.iter().enumerate() {
            let mut key = sex_age.to_string();
            if many_columns {
                key.push_str(", ");
                key.push_str(&column.name);
            }
            if tag_kind {
                key.push_str(", ");
                key.push_str(kind.label());
            }

            let points = rows
                .iter()
                .filter_map(|r| {
                    let v = r.values.get(col_idx).copied()?;
                    v.is_finite().then_some((r.date, v))
                })
                .collect();

            out.push(LineSeries {
                key,
                sex_age: sex_age.to_string(),
                column: column.name.clone(),
                code: column.code,
                kind,
                stroke,
                points,
            });
        }
    }
    out
}
