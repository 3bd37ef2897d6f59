//! Aggregates Module
//! KPI metrics and the per-tab aggregations behind the five dashboard charts.

use crate::data::filter::TripView;
use crate::data::records::{DayOfWeek, PaymentType};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Number of zones in the "top pickup zones" chart
pub const TOP_ZONES: usize = 10;
/// Distances above this are left out of the histogram
pub const DISTANCE_CLIP_MILES: f64 = 30.0;
pub const DISTANCE_BINS: usize = 60;
pub const HOURS: usize = 24;

/// Arithmetic mean; NaN when there are no values.
fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    use statrs::statistics::Statistics;
    values.into_iter().mean()
}

/// Headline metrics for the filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiMetrics {
    pub total_trips: usize,
    pub avg_fare: f64,
    pub total_revenue: f64,
    pub avg_distance: f64,
    pub avg_duration_minutes: f64,
    /// Exported only; not one of the dashboard tiles.
    pub avg_speed_mph: Option<f64>,
}

impl KpiMetrics {
    pub fn compute(view: &TripView<'_>) -> Self {
        Self {
            total_trips: view.len(),
            avg_fare: mean(view.iter().map(|r| r.fare_amount)),
            total_revenue: view.iter().filter_map(|r| r.total_amount).sum(),
            avg_distance: mean(view.iter().map(|r| r.trip_distance)),
            avg_duration_minutes: mean(view.iter().map(|r| r.trip_duration_minutes)),
            avg_speed_mph: mean_speed_mph(view),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCount {
    pub zone: String,
    pub trip_count: usize,
}

/// Busiest pickup zones, ascending by count (bar chart order). Trips without a zone are ignored.
pub fn top_pickup_zones(view: &TripView<'_>, n: usize) -> Vec<ZoneCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for zone in view.iter().filter_map(|r| r.pickup_zone.as_deref()) {
        *counts.entry(zone).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(n);
    ranked.reverse();

    ranked
        .into_iter()
        .map(|(zone, trip_count)| ZoneCount {
            zone: zone.to_string(),
            trip_count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyFare {
    pub hour: u32,
    pub avg_fare: f64,
    pub trip_count: usize,
}

/// Mean fare per pickup hour, for hours that occur.
pub fn average_fare_by_hour(view: &TripView<'_>) -> Vec<HourlyFare> {
    let mut sums = [0.0f64; HOURS];
    let mut counts = [0usize; HOURS];
    for row in view.iter() {
        let h = row.pickup_hour as usize;
        if h < HOURS {
            sums[h] += row.fare_amount;
            counts[h] += 1;
        }
    }

    (0..HOURS)
        .filter(|&h| counts[h] > 0)
        .map(|h| HourlyFare {
            hour: h as u32,
            avg_fare: sums[h] / counts[h] as f64,
            trip_count: counts[h],
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram of trip distances up to `clip` miles.
pub fn distance_histogram(view: &TripView<'_>, clip: f64, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = view
        .iter()
        .map(|r| r.trip_distance)
        .filter(|&d| d <= clip)
        .collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentShare {
    pub payment: PaymentType,
    pub label: String,
    pub count: usize,
    /// Fraction of the view, 0..=1.
    pub share: f64,
}

/// Trip counts per payment label, most common first.
pub fn payment_breakdown(view: &TripView<'_>) -> Vec<PaymentShare> {
    let mut counts: HashMap<PaymentType, usize> = HashMap::new();
    for row in view.iter() {
        *counts.entry(row.payment).or_default() += 1;
    }
    let total = view.len().max(1) as f64;

    let mut shares: Vec<PaymentShare> = counts
        .into_iter()
        .map(|(payment, count)| PaymentShare {
            payment,
            label: payment.label().to_string(),
            count,
            share: count as f64 / total,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    shares
}

/// Trip counts by weekday (rows) and pickup hour (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyHeatmap {
    /// Days present in the view, Monday first.
    pub days: Vec<DayOfWeek>,
    /// One row of 24 hourly counts per entry in `days`.
    pub counts: Vec<[usize; HOURS]>,
}

impl WeeklyHeatmap {
    pub fn compute(view: &TripView<'_>) -> Self {
        let mut grid = [[0usize; HOURS]; 7];
        let mut seen = [false; 7];
        for row in view.iter() {
            let d = row.pickup_day_of_week.index();
            let h = row.pickup_hour as usize;
            if h < HOURS {
                grid[d][h] += 1;
                seen[d] = true;
            }
        }

        let days: Vec<DayOfWeek> = DayOfWeek::ALL
            .into_iter()
            .filter(|d| seen[d.index()])
            .collect();
        let counts = days.iter().map(|d| grid[d.index()]).collect();
        Self { days, counts }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Everything the dashboard shows for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kpis: KpiMetrics,
    pub top_zones: Vec<ZoneCount>,
    pub hourly_fares: Vec<HourlyFare>,
    pub distance_histogram: Vec<HistogramBin>,
    pub payments: Vec<PaymentShare>,
    pub heatmap: WeeklyHeatmap,
}

impl DashboardSummary {
    /// Compute all aggregations, independent ones in parallel.
    pub fn compute(view: &TripView<'_>) -> Self {
        let ((kpis, top_zones), ((hourly_fares, distance_histogram), (payments, heatmap))) =
            rayon::join(
                || {
                    rayon::join(
                        || KpiMetrics::compute(view),
                        || top_pickup_zones(view, TOP_ZONES),
                    )
                },
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || average_fare_by_hour(view),
                                || distance_histogram(view, DISTANCE_CLIP_MILES, DISTANCE_BINS),
                            )
                        },
                        || rayon::join(|| payment_breakdown(view), || WeeklyHeatmap::compute(view)),
                    )
                },
            );

        Self {
            kpis,
            top_zones,
            hourly_fares,
            distance_histogram,
            payments,
            heatmap,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kpis.total_trips == 0
    }
}

/// Mean speed over trips whose speed is defined.
pub fn mean_speed_mph(view: &TripView<'_>) -> Option<f64> {
    let speeds: Vec<f64> = view.par_iter().filter_map(|r| r.trip_speed_mph).collect();
    if speeds.is_empty() {
        None
    } else {
        Some(mean(speeds))
    }
}
