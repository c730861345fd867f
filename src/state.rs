use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::color::ColorMap;
use crate::config::{AppConfig, CHART_TITLE};
use crate::data::loader::load_file;
use crate::data::model::TransitionDataset;
use crate::series::assemble::ChartSpec;
use crate::series::recompute;
use crate::series::selection::SelectorState;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded). Never mutated.
    pub dataset: Option<Arc<TransitionDataset>>,

    /// File the dataset came from.
    pub source: Option<PathBuf>,

    /// Current selector values.
    pub selection: SelectorState,

    /// Last successfully computed chart; kept when a recompute fails.
    pub chart: Option<ChartSpec>,

    /// Colours of the `sex_age` groups in `chart`.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

/// File written by File → Export series….
#[derive(Serialize)]
struct ChartExport<'a> {
    title: &'static str,
    source: Option<&'a Path>,
    selection: &'a SelectorState,
    #[serde(flatten)]
    chart: &'a ChartSpec,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            selection: config.initial_selection.clone(),
            ..Self::default()
        }
    }

    /// Ingest a newly loaded dataset and draw the current selection.
    pub fn set_dataset(&mut self, dataset: TransitionDataset, source: Option<PathBuf>) {
        self.dataset = Some(Arc::new(dataset));
        self.source = source;
        self.chart = None;
        self.status_message = None;
        self.recompute();
    }

    /// Load a file, replacing the current dataset on success.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} observations with {} series from {}",
                    dataset.len(),
                    dataset.catalog.len(),
                    path.display()
                );
                log::debug!("Value columns: {}", dataset.value_columns.join(", "));
                if let Some((first, last)) = dataset.date_span() {
                    log::info!("Observations span {first} to {last}");
                }
                let missing = dataset.missing_series();
                if !missing.is_empty() {
                    log::warn!("{} series absent from file: {}", missing.len(), missing.join(", "));
                }
                let unusable = dataset.is_empty() || dataset.catalog.is_empty();
                self.set_dataset(dataset, Some(path.to_path_buf()));
                if unusable {
                    self.status_message = Some(format!("{} holds no usable observations", path.display()));
                }
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Rebuild the chart from scratch for the current selection. On failure
    /// the previous chart stays on screen.
    pub fn recompute(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        match recompute(dataset, &self.selection) {
            Ok(chart) => {
                self.color_map = ColorMap::for_chart(&chart);
                self.chart = Some(chart);
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Keeping previous chart: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Replace the selection and recompute.
    pub fn set_selection(&mut self, selection: SelectorState) {
        if selection != self.selection {
            self.selection = selection;
            self.recompute();
        }
    }

    /// Write the current chart as JSON.
    pub fn export_chart(&self, path: &Path) -> Result<()> {
        let chart = self.chart.as_ref().context("no chart to export")?;
        let export = ChartExport {
            title: CHART_TITLE,
            source: self.source.as_deref(),
            selection: &self.selection,
            chart,
        };
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &export).context("writing chart JSON")?;
        log::info!("Exported {} series to {}", chart.series.len(), path.display());
        Ok(())
    }
}

/// Insert `value` if absent, remove it otherwise.
pub fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}
