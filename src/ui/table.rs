use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, PREVIEW_COLUMNS};

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Preview of the filtered rows (central panel)
// ---------------------------------------------------------------------------

/// Render the first filtered rows.
pub fn preview_table(ui: &mut Ui, state: &mut AppState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an event database to start  (File → Open…)");
        });
        return;
    }

    let rows = state.preview();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(60.0), PREVIEW_COLUMNS.len())
            .header(20.0, |mut header| {
                for role in PREVIEW_COLUMNS {
                    header.col(|ui: &mut Ui| {
                        ui.strong(role.label());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}
