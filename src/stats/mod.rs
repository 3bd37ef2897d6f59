//! Stats module - KPI metrics and chart aggregations

mod aggregates;

pub use aggregates::{
    average_fare_by_hour, distance_histogram, mean_speed_mph, payment_breakdown,
    top_pickup_zones, DashboardSummary, HistogramBin, HourlyFare, KpiMetrics, PaymentShare,
    WeeklyHeatmap, ZoneCount, DISTANCE_BINS, DISTANCE_CLIP_MILES, HOURS, TOP_ZONES,
};
