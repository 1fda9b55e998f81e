mod app;
mod config;
mod data;
mod geo;
mod state;
mod task;
mod ui;

use app::SeismicFilterApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load_or_default(&config::executable_dir());
    log::info!("Dictionary directory: {}", config.dict_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Seismic Event Filter",
        options,
        Box::new(|_cc| Ok(Box::new(SeismicFilterApp::new(config)))),
    )
}
