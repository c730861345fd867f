use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Polygon};

use crate::config::{BAND_OPACITY, CHART_TITLE};
use crate::series::assemble::{ChartSpec, StrokeStyle};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Transition-rate plot (central panel)
// ---------------------------------------------------------------------------

/// Render the chart in the central panel.
pub fn transition_plot(ui: &mut Ui, state: &AppState) {
    let chart = match &state.chart {
        Some(chart) => chart,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(placeholder_text(state));
            });
            return;
        }
    };

    ui.heading(CHART_TITLE);

    let (y_min, y_max) = y_extent(chart);
    let band_fill = Color32::GRAY.gamma_multiply(BAND_OPACITY);

    Plot::new("transition_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Transition rate")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            // Bands first so the lines draw on top.
            for band in &chart.bands {
                let (x0, x1) = (decimal_year(band.start), decimal_year(band.end));
                let corners = vec![[x0, y_min], [x1, y_min], [x1, y_max], [x0, y_max]];
                plot_ui.polygon(
                    Polygon::new(PlotPoints::new(corners))
                        .fill_color(band_fill)
                        .stroke(Stroke::NONE),
                );
            }

            for series in &chart.series {
                let points: PlotPoints = series
                    .points
                    .iter()
                    .map(|&(date, value)| [decimal_year(date), value])
                    .collect();

                let style = match series.stroke {
                    StrokeStyle::Solid => LineStyle::Solid,
                    StrokeStyle::Dashed => LineStyle::dashed_loose(),
                };

                let line = Line::new(points)
                    .name(&series.key)
                    .color(state.color_map.color_for(&series.sex_age))
                    .style(style)
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}

/// Central-panel text shown while there is no chart.
fn placeholder_text(state: &AppState) -> &'static str {
    if state.dataset.is_some() {
        "No chart for this selection  (see the status bar)"
    } else {
        "Open a data file to view transitions  (File → Open…)"
    }
}

/// Position of a date on the x axis, in fractional years.
pub fn decimal_year(date: NaiveDate) -> f64 {
    let year = date.year();
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days = if leap { 366.0 } else { 365.0 };
    year as f64 + date.ordinal0() as f64 / days
}

/// Vertical span the recession bands cover: the data range plus 5% padding,
/// or `0..1` when there is nothing to plot.
fn y_extent(chart: &ChartSpec) -> (f64, f64) {
    let (min, max) = chart
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(_, v)| v))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 0.5 };
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AgeGroup, FlowKind, Observation, Sex, TransitionCode, TransitionDataset};
    use crate::series::assemble::LineSeries;

    #[test]
    fn decimal_year_positions() {
        assert_eq!(decimal_year(NaiveDate::from_ymd_opt(2001, 1, 1).unwrap()), 2001.0);
        let mid = decimal_year(NaiveDate::from_ymd_opt(2001, 7, 2).unwrap());
        assert!((mid - 2001.4986).abs() < 1e-3);
        assert!(
            decimal_year(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap())
                < decimal_year(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
        );
    }

    #[test]
    fn placeholder_depends_on_loaded_dataset() {
        let mut state = AppState::default();
        assert!(placeholder_text(&state).starts_with("Open a data file"));

        // Loaded, but the default selection's column is absent.
        let observations = vec![Observation {
            date: NaiveDate::from_ymd_opt(2000, 1, 12).unwrap(),
            sex: Sex::Female,
            age_group: AgeGroup::Age16To64,
            values: vec![0.1],
        }];
        state.set_dataset(
            TransitionDataset::from_observations(observations, vec!["rate_UU".to_string()]),
            None,
        );
        assert!(state.chart.is_none());
        assert!(placeholder_text(&state).starts_with("No chart"));
    }

    #[test]
    fn extent_covers_data_with_padding() {
        let mut chart = ChartSpec {
            series: Vec::new(),
            bands: crate::config::recession_bands(),
        };
        assert_eq!(y_extent(&chart), (0.0, 1.0));

        let date = NaiveDate::from_ymd_opt(2000, 1, 12).unwrap();
        chart.series.push(LineSeries {
            key: "f_16-64".into(),
            sex_age: "f_16-64".into(),
            column: "rate_EfEp".into(),
            code: TransitionCode::EfEp,
            kind: FlowKind::Gross,
            stroke: StrokeStyle::Solid,
            points: vec![(date, 0.0), (date, 1.0)],
        });
        let (lo, hi) = y_extent(&chart);
        assert!((lo + 0.05).abs() < 1e-12 && (hi - 1.05).abs() < 1e-12);
    }
}
