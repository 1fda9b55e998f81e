use eframe::egui;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::task::POLL_INTERVAL;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SeismicFilterApp {
    pub state: AppState,
}

impl SeismicFilterApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for SeismicFilterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_task();
        if self.state.is_busy() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: row count + messages ----
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            panels::status_bar(ui, &self.state);
        });

        // ---- Left side panel: source, mapping, filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::preview_table(ui, &mut self.state);
        });

        panels::task_window(ctx, &self.state);
    }
}
