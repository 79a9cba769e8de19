//! Epidash - COVID-19 CSV Analysis & Interactive Dashboard
//!
//! A Rust application for exploring COVID-19 case, death, and vaccination
//! statistics by country and continent: interactive map, charts, and tables.

use eframe::egui;
use epidash::gui::EpidashApp;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Epidash"),
        ..Default::default()
    };

    eframe::run_native(
        "Epidash",
        options,
        Box::new(|cc| Ok(Box::new(EpidashApp::new(cc)))),
    )
}
