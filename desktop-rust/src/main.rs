mod app;
mod io;
mod model;
mod signature_pad;

use app::{configure_fonts, SignoffApp};
use coal_signoff::config::Config;
use coal_signoff::logging::init_logging;

fn main() -> anyhow::Result<()> {
    init_logging(std::env::args().any(|a| a == "-v" || a == "--verbose"));

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "config not loaded, using defaults");
            Config::default()
        }
    };
    let app = SignoffApp::new(config)?;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Coal Roof/Floor Sign-off",
        options,
        Box::new(move |cc| {
            configure_fonts(&cc.egui_ctx);
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
