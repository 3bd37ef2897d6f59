//! Report Export Module
//! Writes the five charts as PNG files plus a JSON summary of the current view.

use crate::charts::{ChartKind, RenderError, StaticChartRenderer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::data::filter::TripFilter;
use crate::stats::DashboardSummary;
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Filter state as written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterSnapshot {
    pub start_date: String,
    pub end_date: String,
    pub hour_start: u32,
    pub hour_end: u32,
    /// Empty means every payment type.
    pub payments: Vec<String>,
}

impl From<&TripFilter> for FilterSnapshot {
    fn from(f: &TripFilter) -> Self {
        Self {
            start_date: f.start_date.format("%Y-%m-%d").to_string(),
            end_date: f.end_date.format("%Y-%m-%d").to_string(),
            hour_start: f.hour_start,
            hour_end: f.hour_end,
            payments: f.payments.iter().map(|p| p.label().to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    dataset: &'a str,
    filter: FilterSnapshot,
    #[serde(flatten)]
    summary: &'a DashboardSummary,
}

/// Write `summary.json` into `dir`.
pub fn write_summary(
    dir: &Path,
    dataset: &str,
    filter: &TripFilter,
    summary: &DashboardSummary,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(SUMMARY_FILE);
    let file = File::create(&path).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    let doc = SummaryDocument {
        dataset,
        filter: FilterSnapshot::from(filter),
        summary,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)?;
    Ok(path)
}

/// Export all charts and the summary. Returns the files written.
pub fn export_report(
    dir: &Path,
    dataset: &str,
    filter: &TripFilter,
    summary: &DashboardSummary,
) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(ChartKind::ALL.len() + 1);
    for kind in ChartKind::ALL {
        let path = dir.join(format!("{}.png", kind.file_stem()));
        StaticChartRenderer::save_png(kind, summary, &path, DEFAULT_WIDTH, DEFAULT_HEIGHT)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    let summary_path = write_summary(dir, dataset, filter, summary)?;
    info!("Wrote {}", summary_path.display());
    written.push(summary_path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::TripView;
    use crate::data::records::tests::record;
    use crate::data::records::{PaymentType, TripTable};

    #[test]
    fn summary_json_has_filter_and_aggregates() {
        let table = TripTable::new(vec![
            record("2024-01-05T04:00:00", PaymentType::CreditCard, Some("JFK Airport")),
            record("2024-01-05T05:00:00", PaymentType::Cash, None),
        ]);
        let mut filter = TripFilter::all_of(&table);
        filter.payments.clear();
        let summary = DashboardSummary::compute(&TripView::all(&table));

        let dir = tempfile::tempdir().unwrap();
        let path = write_summary(dir.path(), "2024-01", &filter, &summary).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["dataset"], "2024-01");
        assert_eq!(json["filter"]["start_date"], "2024-01-05");
        assert_eq!(json["filter"]["payments"].as_array().unwrap().len(), 0);
        assert_eq!(json["kpis"]["total_trips"], 2);
        assert_eq!(json["top_zones"][0]["zone"], "JFK Airport");
        assert_eq!(json["heatmap"]["days"][0], "Friday");
    }
}
