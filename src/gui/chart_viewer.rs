//! Chart Viewer Widget
//! Central panel: header, KPI strip, the five chart tabs and the footer.

use crate::charts::{ChartKind, ChartPlotter};
use crate::stats::{DashboardSummary, KpiMetrics};
use egui::{Color32, RichText, ScrollArea};

const EMPTY_NOTICE: &str =
    "No trips match the current filters. Please adjust your sidebar selections.";

/// Tabbed chart display for one filtered summary.
pub struct ChartViewer {
    pub selected: ChartKind,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            selected: ChartKind::TopZones,
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the viewer. `summary` is `None` while the table is still loading.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        summary: Option<&DashboardSummary>,
        month_title: &str,
    ) {
        let Some(summary) = summary else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Loading trip data...").size(20.0));
            });
            return;
        };

        if summary.is_empty() {
            ui.add_space(20.0);
            egui::Frame::none()
                .fill(Color32::from_rgb(255, 243, 205))
                .rounding(5.0)
                .inner_margin(12.0)
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(format!("⚠ {}", EMPTY_NOTICE))
                            .size(14.0)
                            .color(Color32::from_rgb(133, 100, 4)),
                    );
                });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("🚕 NYC Yellow Taxi Trip Dashboard: {}", month_title))
                        .size(26.0)
                        .strong(),
                );
                ui.label(format!(
                    "Yellow Taxi trips recorded in New York City during {}. \
                     Use the sidebar filters to slice by date, hour and payment type.",
                    month_title
                ));
                ui.add_space(10.0);

                ui.label(RichText::new("📊 Key Metrics").size(18.0).strong());
                ui.add_space(5.0);
                Self::draw_kpis(ui, &summary.kpis);

                ui.add_space(10.0);
                ui.separator();

                ui.horizontal(|ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut self.selected, kind, kind.tab_label());
                    }
                });
                ui.separator();
                ui.add_space(5.0);

                ui.label(RichText::new(self.selected.title()).size(18.0).strong());
                ui.add_space(5.0);
                ChartPlotter::draw(ui, self.selected, summary);
                ui.add_space(5.0);
                ui.label(
                    RichText::new(self.selected.caption())
                        .size(12.0)
                        .color(Color32::GRAY),
                );

                ui.add_space(10.0);
                ui.separator();
                ui.label(
                    RichText::new(format!(
                        "Data source: NYC Taxi & Limousine Commission (TLC), {}",
                        month_title
                    ))
                    .size(11.0)
                    .color(Color32::GRAY),
                );
            });
    }

    fn draw_kpis(ui: &mut egui::Ui, kpis: &KpiMetrics) {
        let metrics = kpi_strings(kpis);
        ui.columns(metrics.len(), |cols| {
            for (col, (label, value)) in cols.iter_mut().zip(metrics.iter()) {
                egui::Frame::none()
                    .fill(col.visuals().widgets.noninteractive.bg_fill)
                    .rounding(8.0)
                    .inner_margin(10.0)
                    .show(col, |ui| {
                        ui.label(RichText::new(*label).size(12.0).color(Color32::GRAY));
                        ui.label(RichText::new(value).size(22.0).strong());
                    });
            }
        });
    }
}

/// Formatted KPI tiles, in display order.
fn kpi_strings(kpis: &KpiMetrics) -> [(&'static str, String); 5] {
    [
        ("Total Trips", group_thousands(kpis.total_trips as f64)),
        ("Avg Fare", format!("${:.2}", kpis.avg_fare)),
        ("Total Revenue", format!("${}", group_thousands(kpis.total_revenue))),
        ("Avg Distance (mi)", format!("{:.2}", kpis.avg_distance)),
        ("Avg Duration (min)", format!("{:.1}", kpis.avg_duration_minutes)),
    ]
}

/// Round to an integer and insert thousands separators.
fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, c) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}
