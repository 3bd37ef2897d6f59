//! NYC Yellow Taxi Dashboard
//!
//! `taxi-dashboard` opens the desktop dashboard.
//! `taxi-dashboard export <dir>` writes the charts and a JSON summary without a window.

use anyhow::{anyhow, bail, Context, Result};
use eframe::egui;
use log::info;
use std::path::PathBuf;
use taxi_dashboard::config::DashboardConfig;
use taxi_dashboard::data::{fetch_and_build, TripFilter, UreqTransport};
use taxi_dashboard::gui::DashboardApp;
use taxi_dashboard::report::export_report;
use taxi_dashboard::stats::DashboardSummary;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = DashboardConfig::from_env().context("Invalid configuration")?;
    info!(
        "Dataset {} (data dir {})",
        config.dataset_month,
        config.data_dir().display()
    );

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => run_gui(config),
        Some("export") => {
            let dir = args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("usage: taxi-dashboard export <dir>"))?;
            run_export(&config, dir)
        }
        Some(other) => bail!("unknown command '{}'; usage: taxi-dashboard [export <dir>]", other),
    }
}

fn run_gui(config: DashboardConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 860.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("NYC Yellow Taxi Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "NYC Yellow Taxi Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("GUI error: {}", e))
}

fn run_export(config: &DashboardConfig, dir: PathBuf) -> Result<()> {
    let table = fetch_and_build(config, &UreqTransport::new())
        .context("Failed to build the trip table")?;
    let filter = TripFilter::all_of(&table);
    let view = filter.apply(&table);
    let summary = DashboardSummary::compute(&view);

    let written = export_report(&dir, &config.dataset_month, &filter, &summary)
        .with_context(|| format!("Failed to export report to {}", dir.display()))?;
    info!("Exported {} files to {}", written.len(), dir.display());
    Ok(())
}
