use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::Role;
use crate::state::AppState;

/// Type codes per row of the checkbox grid.
const TYPE_GRID_COLUMNS: usize = 5;

// ---------------------------------------------------------------------------
// Left side panel – source, column mapping, filters
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            source_section(ui, state);
            ui.separator();

            if state.table.is_none() {
                ui.label("No sheet loaded.");
                return;
            }

            mapping_section(ui, state);
            ui.separator();
            type_section(ui, state);
            ui.separator();
            site_section(ui, state);
            ui.separator();

            let mut group = state.criteria.group_by_site;
            if ui.checkbox(&mut group, "Group by site").changed() {
                state.set_group_by_site(group);
            }
            ui.checkbox(&mut state.apply_transform, "Geodetic coordinates");

            ui.add_space(8.0);
            let can_save = !state.is_busy() && !state.filtered.is_empty();
            if ui.add_enabled(can_save, egui::Button::new("Save…")).clicked() {
                save_file_dialog(state);
            }
        });
}

fn source_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Event database");
    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(!state.is_busy(), egui::Button::new("Open…")).clicked() {
            open_file_dialog(state);
        }
        if let Some(wb) = &state.workbook {
            ui.label(wb.path.display().to_string());
        }
    });

    let Some(sheets) = state.workbook.as_ref().map(|wb| wb.sheet_names.clone()) else {
        return;
    };
    ui.strong("Sheet");
    let current = state
        .sheet
        .and_then(|i| sheets.get(i))
        .cloned()
        .unwrap_or_default();
    egui::ComboBox::from_id_salt("sheet")
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            for (i, name) in sheets.iter().enumerate() {
                if ui.selectable_label(state.sheet == Some(i), name).clicked() {
                    state.select_sheet(i);
                }
            }
        });
}

fn mapping_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Columns");
    let header = state
        .table
        .as_ref()
        .map(|t| t.header.clone())
        .unwrap_or_default();

    egui::Grid::new("column_mapping")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for role in Role::ALL {
                ui.label(format!("{}:", role.label()));
                let current = state.mapping.get(role).unwrap_or("").to_string();
                egui::ComboBox::from_id_salt(("column", role as usize))
                    .selected_text(&current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for name in &header {
                            if ui.selectable_label(current == *name, name).clicked() {
                                state.set_column(role, name);
                            }
                        }
                    });
                ui.end_row();
            }
        });
}

fn type_section(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("Event types ({})", state.criteria.selected_types.len()));
        if ui.small_button("All").clicked() {
            state.select_all_types();
        }
        if ui.small_button("None").clicked() {
            state.clear_types();
        }
    });

    egui::Grid::new("type_codes").show(ui, |ui: &mut Ui| {
        for (i, code) in AppState::type_codes().iter().enumerate() {
            let mut checked = state.criteria.selected_types.contains(code);
            if ui.checkbox(&mut checked, code.as_str()).changed() {
                state.set_type(code, checked);
            }
            if (i + 1) % TYPE_GRID_COLUMNS == 0 {
                ui.end_row();
            }
        }
    });
    if state.criteria.selected_types.is_empty() {
        ui.label(RichText::new("Select at least one event type.").color(Color32::YELLOW));
    }
}

fn site_section(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Sites");
        if ui.small_button("All").clicked() {
            state.select_all_sites();
        }
        if ui.small_button("None").clicked() {
            state.clear_sites();
        }
    });

    let sites = state.config.sites.clone();
    for site in &sites {
        let mut checked = state.criteria.selected_sites.contains(&site.name);
        let label = format!("{}  (*{})", site.name, site.suffix);
        if ui.checkbox(&mut checked, label).changed() {
            state.set_site(&site.name, checked);
        }
    }
    if state.criteria.selected_sites.is_empty() {
        ui.label(RichText::new("Select at least one site.").color(Color32::YELLOW));
    }
}

// ---------------------------------------------------------------------------
// Top bar / status bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.add_enabled(!state.is_busy(), egui::Button::new("Open…")).clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_save = !state.is_busy() && !state.filtered.is_empty();
            if ui.add_enabled(can_save, egui::Button::new("Save…")).clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();
        ui.label(format!("Dictionaries: {}", state.config.dict_dir.display()));
    });
}

/// Render the status line.
pub fn status_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        if let Some(table) = &state.table {
            ui.label(format!(
                "Total rows: {}  (of {})",
                state.filtered.len(),
                table.len()
            ));
            ui.separator();
        }
        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).strong());
        }
    });
}

/// Progress window for the running background task.
pub fn task_window(ctx: &egui::Context, state: &AppState) {
    let Some(task) = &state.task else {
        return;
    };
    let progress = task.progress();

    egui::Window::new(task.title())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            if let Some(msg) = &progress.message {
                ui.label(msg);
            }
            let bar = match progress.fraction() {
                Some(f) => egui::ProgressBar::new(f).show_percentage(),
                None => egui::ProgressBar::new(0.0).animate(true),
            };
            ui.add(bar.desired_width(300.0));
            if task.can_abort() && ui.button("Cancel").clicked() {
                task.cancel();
            }
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open event database")
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "ods", "csv"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_workbook(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save filtered events")
        .add_filter("Excel", &["xlsx"])
        .add_filter("CSV", &["csv"])
        .set_file_name("filtered.xlsx")
        .save_file();

    if let Some(path) = file {
        state.start_export(&path);
    }
}
