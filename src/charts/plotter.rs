//! Chart Plotter Module
//! Draws the five dashboard charts interactively using egui_plot.

use crate::charts::palette;
use crate::stats::{
    DashboardSummary, HistogramBin, HourlyFare, PaymentShare, WeeklyHeatmap, ZoneCount,
};
use egui::{Align2, Color32, FontId, RichText, Sense, Stroke};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

pub const CHART_HEIGHT: f32 = 420.0;

/// One chart tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    TopZones,
    HourlyFare,
    Distance,
    Payments,
    Heatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::TopZones,
        ChartKind::HourlyFare,
        ChartKind::Distance,
        ChartKind::Payments,
        ChartKind::Heatmap,
    ];

    pub fn tab_label(self) -> &'static str {
        match self {
            ChartKind::TopZones => "Top Pickup Zones",
            ChartKind::HourlyFare => "Hourly Fare Patterns",
            ChartKind::Distance => "Trip Distance",
            ChartKind::Payments => "Payment Types",
            ChartKind::Heatmap => "Weekly Heatmap",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::TopZones => "Top 10 Pickup Zones by Trip Count",
            ChartKind::HourlyFare => "Average Fare Amount by Hour of Day",
            ChartKind::Distance => "Distribution of Trip Distances",
            ChartKind::Payments => "Trip Breakdown by Payment Type",
            ChartKind::Heatmap => "Trip Count by Day of Week and Hour",
        }
    }

    /// File name stem for exported images.
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::TopZones => "top_pickup_zones",
            ChartKind::HourlyFare => "hourly_fare",
            ChartKind::Distance => "trip_distance",
            ChartKind::Payments => "payment_types",
            ChartKind::Heatmap => "weekly_heatmap",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            ChartKind::TopZones => {
                "Midtown Manhattan transit hubs and the airports generate the most pickups."
            }
            ChartKind::HourlyFare => {
                "Early-morning trips carry the highest average fare; \
                 midday trips are shorter and cheaper."
            }
            ChartKind::Distance => {
                "Right-skewed: most trips are short hops, with a long tail of airport and \
                 inter-borough rides. Trips over 30 miles are not shown."
            }
            ChartKind::Payments => {
                "Credit cards dominate. Tips are only recorded for card payments."
            }
            ChartKind::Heatmap => {
                "Weekday commute peaks and late weekend nights stand out."
            }
        }
    }
}

fn color32(rgb: (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

/// Creates the interactive dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the chart for `kind` from a precomputed summary.
    pub fn draw(ui: &mut egui::Ui, kind: ChartKind, summary: &DashboardSummary) {
        match kind {
            ChartKind::TopZones => Self::draw_top_zones(ui, &summary.top_zones),
            ChartKind::HourlyFare => Self::draw_hourly_fare(ui, &summary.hourly_fares),
            ChartKind::Distance => Self::draw_distance_histogram(ui, &summary.distance_histogram),
            ChartKind::Payments => Self::draw_payment_pie(ui, &summary.payments),
            ChartKind::Heatmap => Self::draw_heatmap(ui, &summary.heatmap),
        }
    }

    /// Horizontal bars, busiest zone on top.
    pub fn draw_top_zones(ui: &mut egui::Ui, zones: &[ZoneCount]) {
        let max = zones.iter().map(|z| z.trip_count).max().unwrap_or(0);
        let bars: Vec<Bar> = zones
            .iter()
            .enumerate()
            .map(|(i, z)| {
                Bar::new(i as f64, z.trip_count as f64)
                    .name(&z.zone)
                    .fill(color32(palette::orange_for(z.trip_count, max)))
                    .width(0.7)
            })
            .collect();

        let labels: Vec<String> = zones.iter().map(|z| z.zone.clone()).collect();

        Plot::new("top_zones")
            .height(CHART_HEIGHT)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label("Number of Trips")
            .y_axis_label("Pickup Zone")
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < labels.len() {
                    labels[idx as usize].clone()
                } else {
                    String::new()
                }
            })
            .include_x(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal().name("Trips"));
            });
    }

    /// Line with markers, one point per hour present.
    pub fn draw_hourly_fare(ui: &mut egui::Ui, fares: &[HourlyFare]) {
        let points: Vec<[f64; 2]> = fares
            .iter()
            .map(|f| [f.hour as f64, f.avg_fare])
            .collect();
        let color = color32(palette::ACCENT);

        Plot::new("hourly_fare")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Hour of Day (0-23)")
            .y_axis_label("Average Fare ($)")
            .include_x(0.0)
            .include_x(23.0)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(color)
                        .width(3.0)
                        .name("Average fare"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(4.0)
                        .color(color),
                );
            });
    }

    pub fn draw_distance_histogram(ui: &mut egui::Ui, bins: &[HistogramBin]) {
        let color = color32(palette::ACCENT);
        let bars: Vec<Bar> = bins
            .iter()
            .map(|b| {
                let width = b.end - b.start;
                Bar::new((b.start + b.end) / 2.0, b.count as f64)
                    .width(width * 0.95)
                    .fill(color)
                    .name(format!("{:.1}-{:.1} mi", b.start, b.end))
            })
            .collect();

        Plot::new("distance_histogram")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Trip Distance (miles)")
            .y_axis_label("Number of Trips")
            .include_y(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(color).name("Trips"));
            });
    }

    /// Pie slices as polygons on an equal-aspect plot.
    pub fn draw_payment_pie(ui: &mut egui::Ui, shares: &[PaymentShare]) {
        let slices = pie_slices(shares);

        Plot::new("payment_pie")
            .height(CHART_HEIGHT)
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .include_x(-1.2)
            .include_x(1.2)
            .include_y(-1.2)
            .include_y(1.2)
            .show(ui, |plot_ui| {
                for (i, (share, outline, mid_angle)) in slices.iter().enumerate() {
                    let color = color32(palette::categorical(i));
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from_iter(outline.iter().copied()))
                            .fill_color(color)
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(&share.label),
                    );
                    if share.share >= 0.03 {
                        let r = 0.65;
                        plot_ui.text(Text::new(
                            PlotPoint::new(r * mid_angle.cos(), r * mid_angle.sin()),
                            RichText::new(format!("{}\n{:.1}%", share.label, share.share * 100.0))
                                .color(Color32::BLACK)
                                .size(12.0),
                        ));
                    }
                }
            });
    }

    /// Day-by-hour grid painted directly, Monday at the top.
    pub fn draw_heatmap(ui: &mut egui::Ui, heatmap: &WeeklyHeatmap) {
        if heatmap.is_empty() {
            ui.label("Not enough data to display the heatmap for the current filters.");
            return;
        }

        let label_w = 90.0;
        let header_h = 20.0;
        let avail = ui.available_width().max(400.0);
        let cell_w = (avail - label_w) / 24.0;
        let cell_h = ((CHART_HEIGHT - header_h) / heatmap.days.len() as f32).min(48.0);
        let size = egui::vec2(avail, header_h + cell_h * heatmap.days.len() as f32);

        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
        let painter = ui.painter_at(rect);
        let max = heatmap.max_count();
        let text_color = ui.visuals().text_color();
        let font = FontId::proportional(11.0);

        for hour in 0..24 {
            let x = rect.left() + label_w + cell_w * (hour as f32 + 0.5);
            painter.text(
                egui::pos2(x, rect.top() + header_h / 2.0),
                Align2::CENTER_CENTER,
                hour.to_string(),
                font.clone(),
                text_color,
            );
        }

        let mut hovered = None;
        for (row, (day, counts)) in heatmap.days.iter().zip(heatmap.counts.iter()).enumerate() {
            let top = rect.top() + header_h + cell_h * row as f32;
            painter.text(
                egui::pos2(rect.left() + label_w - 6.0, top + cell_h / 2.0),
                Align2::RIGHT_CENTER,
                day.name(),
                font.clone(),
                text_color,
            );
            for (hour, &count) in counts.iter().enumerate() {
                let cell = egui::Rect::from_min_size(
                    egui::pos2(rect.left() + label_w + cell_w * hour as f32, top),
                    egui::vec2(cell_w - 1.0, cell_h - 1.0),
                );
                painter.rect_filled(cell, 2.0, color32(palette::heat_color(count, max)));
                if response
                    .hover_pos()
                    .map(|p| cell.contains(p))
                    .unwrap_or(false)
                {
                    hovered = Some((*day, hour, count));
                }
            }
        }

        if let Some((day, hour, count)) = hovered {
            response.on_hover_text(format!("{} {:02}:00 - {} trips", day.name(), hour, count));
        }
    }
}

/// Outline points and mid-angle for each slice, starting at 12 o'clock, clockwise.
pub(crate) fn pie_slices(shares: &[PaymentShare]) -> Vec<(&PaymentShare, Vec<[f64; 2]>, f64)> {
    let mut start = std::f64::consts::FRAC_PI_2;
    shares
        .iter()
        .map(|share| {
            let sweep = share.share * std::f64::consts::TAU;
            let steps = ((sweep / 0.05).ceil() as usize).max(2);
            let mut outline = Vec::with_capacity(steps + 2);
            outline.push([0.0, 0.0]);
            for s in 0..=steps {
                let a = start - sweep * s as f64 / steps as f64;
                outline.push([a.cos(), a.sin()]);
            }
            let mid = start - sweep / 2.0;
            start -= sweep;
            (share, outline, mid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::PaymentType;

    #[test]
    fn slices_cover_the_full_circle() {
        let shares = vec![
            PaymentShare {
                payment: PaymentType::CreditCard,
                label: "Credit Card".into(),
                count: 3,
                share: 0.75,
            },
            PaymentShare {
                payment: PaymentType::Cash,
                label: "Cash".into(),
                count: 1,
                share: 0.25,
            },
        ];
        let slices = pie_slices(&shares);
        assert_eq!(slices.len(), 2);
        let last = slices[1].1.last().copied().unwrap();
        // back at 12 o'clock
        assert!((last[0] - 0.0).abs() < 1e-9);
        assert!((last[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn every_kind_has_a_distinct_file_stem() {
        let mut stems: Vec<&str> = ChartKind::ALL.iter().map(|k| k.file_stem()).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), ChartKind::ALL.len());
    }
}
