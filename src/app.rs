use eframe::egui;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct LaborFlowsApp {
    pub state: AppState,
}

impl LaborFlowsApp {
    /// Build the app and load the configured dataset if it exists.
    pub fn new(config: &AppConfig) -> Self {
        let mut state = AppState::new(config);
        if config.data_path.exists() {
            state.load_path(&config.data_path);
        } else {
            log::warn!(
                "{} not found; use File → Open… to load a dataset",
                config.data_path.display()
            );
        }
        Self { state }
    }
}

impl eframe::App for LaborFlowsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selectors ----
        egui::SidePanel::left("selector_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::transition_plot(ui, &self.state);
        });
    }
}
