use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::{AgeGroup, Sex, TransitionCode};
use crate::series::selection::FlowMode;
use crate::state::{toggle, AppState};

// ---------------------------------------------------------------------------
// Left side panel – selector widgets
// ---------------------------------------------------------------------------

/// Render the selector panel. Edits go to a copy of the selection which is
/// committed once, so one frame triggers at most one recompute.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    let mut sel = state.selection.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Sex ----
            ui.strong("Sex");
            ui.horizontal(|ui: &mut Ui| {
                for sex in Sex::ALL {
                    let mut checked = sel.sexes.contains(&sex);
                    if ui.checkbox(&mut checked, sex.code()).changed() {
                        toggle(&mut sel.sexes, sex);
                    }
                }
            });
            ui.separator();

            // ---- Age groups ----
            let header = format!("Age group  ({}/{})", sel.age_groups.len(), AgeGroup::ALL.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("age_groups")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            sel.age_groups = AgeGroup::ALL.into_iter().collect();
                        }
                        if ui.small_button("None").clicked() {
                            sel.age_groups.clear();
                        }
                    });
                    for age in AgeGroup::ALL {
                        let mut checked = sel.age_groups.contains(&age);
                        if ui.checkbox(&mut checked, age.label()).changed() {
                            toggle(&mut sel.age_groups, age);
                        }
                    }
                });
            ui.separator();

            // ---- Transitions ----
            let header = format!(
                "Transition  ({}/{})",
                sel.transition_codes.len(),
                TransitionCode::ALL.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("transitions")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            sel.transition_codes = TransitionCode::ALL.into_iter().collect();
                        }
                        if ui.small_button("None").clicked() {
                            sel.transition_codes.clear();
                        }
                    });
                    for code in TransitionCode::ALL {
                        let mut checked = sel.transition_codes.contains(&code);
                        if ui.checkbox(&mut checked, code.label()).on_hover_text(code.code()).changed() {
                            toggle(&mut sel.transition_codes, code);
                        }
                    }
                });
            ui.separator();

            // ---- Seasonal adjustment / flow mode ----
            ui.checkbox(&mut sel.seasonal, "seasonally adjusted");
            ui.separator();

            ui.strong("Flow rate");
            for mode in FlowMode::ALL {
                ui.radio_value(&mut sel.flow_mode, mode, mode.label());
            }
            ui.separator();

            // ---- Legend ----
            ui.strong("Groups");
            for (key, color) in state.color_map.legend_entries() {
                ui.label(RichText::new(key).color(color));
            }
        });

    state.set_selection(sel);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.chart.is_some(), egui::Button::new("Export series…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let series = state.chart.as_ref().map_or(0, |c| c.series.len());
            ui.label(format!("{} observations loaded, {series} series", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open transition data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export series")
        .add_filter("JSON", &["json"])
        .set_file_name("series.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_chart(&path) {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
