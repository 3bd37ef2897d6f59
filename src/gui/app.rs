//! Taxi Dashboard Main Application
//! Main window with the filter panel and the chart viewer.

use crate::config::{parse_month, DashboardConfig};
use crate::data::{
    build_unified_table, ensure_local, FetchOutcome, TableCache, TripTable, UreqTransport,
};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::report::export_report;
use crate::stats::DashboardSummary;
use egui::SidePanel;
use log::{error, info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Loading result from the background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Arc<TripTable>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    cache: Arc<TableCache>,
    table: Option<Arc<TripTable>>,
    summary: Option<DashboardSummary>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    month_title: String,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let month_title = config.month_title();
        let mut app = Self {
            config,
            cache: Arc::new(TableCache::new()),
            table: None,
            summary: None,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            month_title,
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Fetch missing files and build the table in a background thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.set_progress(0.0, "Checking local data...");

        let config = self.config.clone();
        let cache = Arc::clone(&self.cache);
        thread::spawn(move || Self::run_loading(tx, config, cache));
    }

    /// Run fetch + build (called from background thread)
    fn run_loading(tx: Sender<LoadResult>, config: DashboardConfig, cache: Arc<TableCache>) {
        let transport = UreqTransport::new();
        let trip_path = config.trip_path();
        let zone_path = config.zone_path();

        let resources = [
            (10.0, "trip records", config.trip_url.as_str(), trip_path.as_path()),
            (30.0, "zone lookup", config.zone_url.as_str(), zone_path.as_path()),
        ];
        for (progress, name, url, path) in resources {
            let _ = tx.send(LoadResult::Progress(progress, format!("Fetching {}...", name)));
            match ensure_local(&transport, url, path) {
                Ok(FetchOutcome::AlreadyPresent) => {}
                Ok(FetchOutcome::Downloaded { bytes }) => {
                    info!("Fetched {} ({} bytes)", name, bytes);
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                    return;
                }
            }
        }

        let _ = tx.send(LoadResult::Progress(
            50.0,
            "Cleaning and enriching trips...".to_string(),
        ));
        match cache.get_or_build(&trip_path, &zone_path, build_unified_table) {
            Ok(table) => {
                let _ = tx.send(LoadResult::Complete(table));
            }
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(table) => {
                        let month = parse_month(&self.config.dataset_month).ok();
                        self.control_panel.set_table(&table, month);
                        self.control_panel.set_progress(
                            100.0,
                            &format!("Loaded {} trips", table.len()),
                        );
                        self.table = Some(table);
                        self.recompute();
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(message) => {
                        error!("Loading failed: {}", message);
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", message));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Re-derive the view and every aggregation from the current filter.
    fn recompute(&mut self) {
        let (Some(table), Some(filter)) = (self.table.as_ref(), self.control_panel.filter()) else {
            self.summary = None;
            return;
        };
        let view = filter.apply(table);
        self.summary = Some(DashboardSummary::compute(&view));
    }

    /// Handle chart export - render the five charts and the summary into a chosen folder
    fn handle_export(&mut self) {
        let (Some(summary), Some(filter)) = (self.summary.as_ref(), self.control_panel.filter())
        else {
            self.control_panel.set_progress(0.0, "No charts to export");
            return;
        };

        let dir = match rfd::FileDialog::new()
            .set_title("Export Charts")
            .pick_folder()
        {
            Some(dir) => dir,
            None => return,
        };

        match export_report(&dir, &self.config.dataset_month, &filter, summary) {
            Ok(written) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Exported {} files to {}", written.len(), dir.display()),
                );
                if let Err(e) = open::that(&dir) {
                    warn!("Could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                error!("Export failed: {}", e);
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let can_export = self.summary.as_ref().is_some_and(|s| !s.is_empty());
                    let action = self.control_panel.show(ui, can_export, self.is_loading);

                    match action {
                        ControlPanelAction::FilterChanged => self.recompute(),
                        ControlPanelAction::ExportCharts => self.handle_export(),
                        ControlPanelAction::Reload => self.start_loading(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer
                .show(ui, self.summary.as_ref(), &self.month_title);
        });
    }
}
