mod app;
mod config;

use app::App;
use config::Config;

fn main() {
    // Initialize logging
    env_logger::init();

    // --- 1. LOAD SCENE ---
    let loaded = match std::env::args().nth(1) {
        Some(path) => Config::load(&path),
        None => Config::load_default(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load scene: {}", e);
            std::process::exit(1);
        }
    };

    // --- 2. BUILD CALLOUTS ---
    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Failed to build scene: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Stage ready with {} callouts", app.stage().callouts().count());

    // --- 3. RUN TIMELINE ---
    match app.run() {
        Ok(report) => log::info!(
            "Done: {} shown, {} dismissed, {} inside taps, {} snapshots",
            report.shown,
            report.dismissed,
            report.taps_inside,
            report.snapshots
        ),
        Err(e) => {
            log::error!("Timeline failed: {}", e);
            std::process::exit(1);
        }
    }
}
