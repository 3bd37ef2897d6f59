//! Static Chart Renderer
//! Generates PNG images of the five dashboard charts with plotters.
//!
//! Every chart is drawn into an in-memory RGB buffer and then encoded with the
//! `image` crate, so the same code serves file export and in-memory use.

use crate::charts::palette;
use crate::charts::plotter::{pie_slices, ChartKind};
use crate::stats::{
    DashboardSummary, HistogramBin, HourlyFare, PaymentShare, WeeklyHeatmap, ZoneCount,
};
use image::RgbImage;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 700;

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing error: {0}")]
    Drawing(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Render buffer does not match {0}x{1}")]
    Buffer(u32, u32),
}

fn drawing<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

fn rgb(c: (u8, u8, u8)) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render one chart to an RGB image.
    pub fn render(
        kind: ChartKind,
        summary: &DashboardSummary,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, RenderError> {
        let mut buf = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(drawing)?;

            match kind {
                ChartKind::TopZones => Self::draw_top_zones(&root, &summary.top_zones)?,
                ChartKind::HourlyFare => Self::draw_hourly_fare(&root, &summary.hourly_fares)?,
                ChartKind::Distance => Self::draw_histogram(&root, &summary.distance_histogram)?,
                ChartKind::Payments => Self::draw_pie(&root, &summary.payments)?,
                ChartKind::Heatmap => Self::draw_heatmap(&root, &summary.heatmap)?,
            }

            root.present().map_err(drawing)?;
        }

        RgbImage::from_raw(width, height, buf).ok_or(RenderError::Buffer(width, height))
    }

    /// Render one chart and write it as PNG.
    pub fn save_png(
        kind: ChartKind,
        summary: &DashboardSummary,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let img = Self::render(kind, summary, width, height)?;
        img.save(path)?;
        Ok(())
    }

    fn draw_no_data(root: &Area<'_>, title: &str) -> Result<(), RenderError> {
        let (w, h) = root.dim_in_pixel();
        let style =
            TextStyle::from((FONT, 28.0).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(title.to_string(), (w as i32 / 2, 40), style.clone()))
            .map_err(drawing)?;
        root.draw(&Text::new("No data", (w as i32 / 2, h as i32 / 2), style))
            .map_err(drawing)?;
        Ok(())
    }

    fn draw_top_zones(root: &Area<'_>, zones: &[ZoneCount]) -> Result<(), RenderError> {
        let title = ChartKind::TopZones.title();
        if zones.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let n = zones.len() as i32;
        let max = zones.iter().map(|z| z.trip_count).max().unwrap_or(0);
        let x_max = (max as f64 * 1.1).max(1.0);
        let labels: Vec<&str> = zones.iter().map(|z| z.zone.as_str()).collect();

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28.0))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(260)
            .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(zones.len())
            .y_label_formatter(&|v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(i) => labels
                    .get(*i as usize)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("Number of Trips")
            .y_desc("Pickup Zone")
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(zones.iter().enumerate().map(|(i, z)| {
                let i = i as i32;
                let mut bar = Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(i)),
                        (z.trip_count as f64, SegmentValue::Exact(i + 1)),
                    ],
                    rgb(palette::orange_for(z.trip_count, max)).filled(),
                );
                bar.set_margin(6, 6, 0, 0);
                bar
            }))
            .map_err(drawing)?;
        Ok(())
    }

    fn draw_hourly_fare(root: &Area<'_>, fares: &[HourlyFare]) -> Result<(), RenderError> {
        let title = ChartKind::HourlyFare.title();
        if fares.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let y_max = fares
            .iter()
            .map(|f| f.avg_fare)
            .fold(0.0f64, f64::max)
            .max(1.0)
            * 1.15;
        let color = rgb(palette::ACCENT);
        let points: Vec<(f64, f64)> = fares.iter().map(|f| (f.hour as f64, f.avg_fare)).collect();

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28.0))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..23.5f64, 0f64..y_max)
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .x_labels(24)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("${:.0}", y))
            .x_desc("Hour of Day (0-23)")
            .y_desc("Average Fare ($)")
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(3)))
            .map_err(drawing)?;
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 5, color.filled())))
            .map_err(drawing)?;
        Ok(())
    }

    fn draw_histogram(root: &Area<'_>, bins: &[HistogramBin]) -> Result<(), RenderError> {
        let title = ChartKind::Distance.title();
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return Self::draw_no_data(root, title);
        };

        let max = bins.iter().map(|b| b.count).max().unwrap_or(0);
        let y_max = (max as f64 * 1.1).max(1.0);
        let color = rgb(palette::ACCENT);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28.0))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(first.start..last.end, 0f64..y_max)
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Trip Distance (miles)")
            .y_desc("Number of Trips")
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(bins.iter().map(|b| {
                let mut bar =
                    Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], color.filled());
                bar.set_margin(0, 0, 1, 1);
                bar
            }))
            .map_err(drawing)?;
        Ok(())
    }

    fn draw_pie(root: &Area<'_>, shares: &[PaymentShare]) -> Result<(), RenderError> {
        let title = ChartKind::Payments.title();
        if shares.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let (w, h) = root.dim_in_pixel();
        let title_style =
            TextStyle::from((FONT, 28.0).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(title.to_string(), (w as i32 / 2, 20), title_style))
            .map_err(drawing)?;

        let cx = w as f64 / 2.0;
        let cy = h as f64 / 2.0 + 25.0;
        let radius = (w.min(h) as f64 / 2.0 - 70.0).max(10.0);
        let to_px = |p: [f64; 2]| ((cx + radius * p[0]) as i32, (cy - radius * p[1]) as i32);

        let label_style =
            TextStyle::from((FONT, 18.0).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        for (i, (share, outline, mid)) in pie_slices(shares).into_iter().enumerate() {
            let points: Vec<(i32, i32)> = outline.into_iter().map(to_px).collect();
            root.draw(&Polygon::new(points, rgb(palette::categorical(i)).filled()))
                .map_err(drawing)?;

            if share.share >= 0.03 {
                let at = to_px([0.65 * mid.cos(), 0.65 * mid.sin()]);
                root.draw(&Text::new(
                    format!("{} {:.1}%", share.label, share.share * 100.0),
                    at,
                    label_style.clone(),
                ))
                .map_err(drawing)?;
            }
        }
        Ok(())
    }

    fn draw_heatmap(root: &Area<'_>, heatmap: &WeeklyHeatmap) -> Result<(), RenderError> {
        let title = ChartKind::Heatmap.title();
        if heatmap.is_empty() {
            return Self::draw_no_data(root, title);
        }

        let n = heatmap.days.len() as i32;
        let max = heatmap.max_count();
        // plotters' y axis grows upward; first day goes on top
        let day_at = |i: i32| heatmap.days.get((n - 1 - i) as usize).map(|d| d.name());

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 28.0))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(120)
            .build_cartesian_2d((0..24).into_segmented(), (0..n).into_segmented())
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(24)
            .y_labels(heatmap.days.len())
            .x_label_formatter(&|v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(h) => h.to_string(),
                _ => String::new(),
            })
            .y_label_formatter(&|v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(i) => day_at(*i).unwrap_or_default().to_string(),
                _ => String::new(),
            })
            .x_desc("Hour of Day")
            .y_desc("Day of Week")
            .draw()
            .map_err(drawing)?;

        let cells = heatmap
            .counts
            .iter()
            .enumerate()
            .flat_map(|(row, counts)| {
                let y = n - 1 - row as i32;
                counts.iter().enumerate().map(move |(hour, &count)| (hour as i32, y, count))
            });
        chart
            .draw_series(cells.map(|(hour, y, count)| {
                Rectangle::new(
                    [
                        (SegmentValue::Exact(hour), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(hour + 1), SegmentValue::Exact(y + 1)),
                    ],
                    rgb(palette::heat_color(count, max)).filled(),
                )
            }))
            .map_err(drawing)?;
        Ok(())
    }
}
