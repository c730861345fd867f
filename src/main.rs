mod app;
mod color;
mod config;
mod data;
mod error;
mod series;
mod state;
mod ui;

use app::LaborFlowsApp;
use config::{AppConfig, CHART_TITLE};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env();
    log::info!("Starting with data file {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        CHART_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(LaborFlowsApp::new(&config)))),
    )
}
