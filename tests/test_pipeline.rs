use std::cell::Cell;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use taxi_dashboard::config::DashboardConfig;
use taxi_dashboard::data::{
    build_unified_table, fetch_and_build, DayOfWeek, FetchError, PaymentType, TableCache,
    Transport, TripFilter, TripTable,
};
use taxi_dashboard::stats::DashboardSummary;
use tempfile::{tempdir, TempDir};

/// Trip and zone files inside a temporary directory.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn trip_path(&self) -> PathBuf {
        self.path().join("trips.parquet")
    }

    fn zone_path(&self) -> PathBuf {
        self.path().join("zones.csv")
    }

    fn write_trips(&self, mut df: DataFrame) {
        let mut file = File::create(self.trip_path()).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();
    }

    fn write_zones(&self) {
        let mut file = File::create(self.zone_path()).unwrap();
        CsvWriter::new(&mut file).finish(&mut zones()).unwrap();
    }

    fn write_sources(&self) {
        self.write_trips(trips());
        self.write_zones();
    }
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn naive_column(name: &str, values: Vec<Option<NaiveDateTime>>) -> Column {
    DatetimeChunked::from_naive_datetime_options(name.into(), values, TimeUnit::Microseconds)
        .into_series()
        .into()
}

fn datetimes(name: &str, values: &[&str]) -> Column {
    naive_column(name, values.iter().map(|v| Some(ts(v))).collect())
}

fn zones() -> DataFrame {
    DataFrame::new(vec![
        Column::new("LocationID".into(), [1i64, 2]),
        Column::new("Borough".into(), ["Manhattan", "Queens"]),
        Column::new("Zone".into(), ["Midtown Center", "JFK Airport"]),
    ])
    .unwrap()
}

/// Seven raw trips; C, D and E survive cleaning.
fn trips() -> DataFrame {
    DataFrame::new(vec![
        datetimes(
            "tpep_pickup_datetime",
            &[
                "2024-01-05T01:00:00", // A: zero fare
                "2024-01-05T02:00:00", // B: dropoff == pickup
                "2024-01-05T04:00:00", // C
                "2024-01-06T10:00:00", // D: unknown pickup zone, code 7
                "2024-01-07T23:30:00", // E: unknown dropoff zone, missing code
                "2024-01-07T12:00:00", // F: fare above cap
                "2024-01-07T13:00:00", // G: zero distance
            ],
        ),
        datetimes(
            "tpep_dropoff_datetime",
            &[
                "2024-01-05T01:10:00",
                "2024-01-05T02:00:00",
                "2024-01-05T04:15:00",
                "2024-01-06T10:20:00",
                "2024-01-07T23:45:00",
                "2024-01-07T12:30:00",
                "2024-01-07T13:05:00",
            ],
        ),
        Column::new("PULocationID".into(), [1i32, 1, 1, 999, 2, 1, 1]),
        Column::new("DOLocationID".into(), [2i32, 2, 2, 1, 999, 2, 2]),
        Column::new("trip_distance".into(), [1.0f64, 1.0, 2.5, 3.0, 1.0, 5.0, 0.0]),
        Column::new("fare_amount".into(), [0.0f64, 9.0, 12.0, 20.0, 8.0, 600.0, 5.0]),
        Column::new(
            "total_amount".into(),
            [Some(1.0f64), Some(10.0), Some(15.0), Some(25.0), None, Some(610.0), Some(6.0)],
        ),
        Column::new(
            "payment_type".into(),
            [Some(1i64), Some(1), Some(1), Some(7), None, Some(2), Some(2)],
        ),
    ])
    .unwrap()
}

fn build(fx: &Fixture) -> TripTable {
    build_unified_table(&fx.trip_path(), &fx.zone_path()).unwrap()
}

#[test]
fn test_cleaning_keeps_only_valid_trips_in_source_order() {
    let fx = Fixture::new();
    fx.write_sources();
    let table = build(&fx);

    assert_eq!(table.len(), 3);
    let pickups: Vec<NaiveDateTime> = table.rows().iter().map(|r| r.pickup_timestamp).collect();
    assert_eq!(
        pickups,
        vec![
            ts("2024-01-05T04:00:00"),
            ts("2024-01-06T10:00:00"),
            ts("2024-01-07T23:30:00")
        ]
    );
}

#[test]
fn test_derived_features_of_a_fifteen_minute_trip() {
    let fx = Fixture::new();
    fx.write_sources();
    let table = build(&fx);

    let c = &table.rows()[0];
    assert_abs_diff_eq!(c.trip_duration_minutes, 15.0, epsilon = 1e-9);
    assert_abs_diff_eq!(c.trip_speed_mph.unwrap(), 10.0, epsilon = 1e-9);
    assert_eq!(c.pickup_hour, 4);
    assert_eq!(c.pickup_day_of_week, DayOfWeek::Friday);
    assert_eq!(c.pickup_day_of_week.name(), "Friday");
    assert_eq!(c.pickup_zone.as_deref(), Some("Midtown Center"));
    assert_eq!(c.pickup_borough.as_deref(), Some("Manhattan"));
    assert_eq!(c.dropoff_zone.as_deref(), Some("JFK Airport"));
    assert_eq!(c.payment_label(), "Credit Card");
}

#[test]
fn test_left_joins_and_payment_fallbacks() {
    let fx = Fixture::new();
    fx.write_sources();
    let table = build(&fx);

    let d = &table.rows()[1];
    assert_eq!(d.pickup_location_id, 999);
    assert!(d.pickup_zone.is_none());
    assert!(d.pickup_borough.is_none());
    assert_eq!(d.dropoff_zone.as_deref(), Some("Midtown Center"));
    assert_eq!(d.payment_type_code, Some(7));
    assert_eq!(d.payment_label(), "Unknown");

    let e = &table.rows()[2];
    assert!(e.dropoff_zone.is_none());
    assert_eq!(e.pickup_zone.as_deref(), Some("JFK Airport"));
    assert_eq!(e.payment_type_code, None);
    assert_eq!(e.payment, PaymentType::Unknown);
    assert_eq!(e.total_amount, None);
    assert_eq!(e.pickup_day_of_week, DayOfWeek::Sunday);
}

#[test]
fn test_row_invariants_hold() {
    let fx = Fixture::new();
    fx.write_sources();
    let table = build(&fx);

    for row in table.rows() {
        assert!(row.trip_distance > 0.0);
        assert!(row.fare_amount > 0.0 && row.fare_amount <= 500.0);
        assert!(row.dropoff_timestamp > row.pickup_timestamp);
        assert!(row.trip_duration_minutes >= 0.0);
        assert!(row.pickup_hour <= 23);
        assert_eq!(row.trip_speed_mph.is_none(), row.trip_duration_minutes == 0.0);
        assert_eq!(row.payment, PaymentType::from_code(row.payment_type_code));
    }
}

#[test]
fn test_rebuild_is_identical_and_cache_builds_once() {
    let fx = Fixture::new();
    fx.write_sources();
    assert_eq!(build(&fx), build(&fx));

    let cache = TableCache::new();
    let first = cache
        .get_or_build(&fx.trip_path(), &fx.zone_path(), build_unified_table)
        .unwrap();
    let second = cache
        .get_or_build(&fx.trip_path(), &fx.zone_path(), |_, _| {
            panic!("source files did not change")
        })
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_filters_and_empty_payment_selection() {
    let fx = Fixture::new();
    fx.write_sources();
    let table = build(&fx);

    let mut filter = TripFilter::all_of(&table);
    assert_eq!(filter.apply(&table).len(), 3);
    filter.payments.clear();
    assert_eq!(filter.apply(&table).len(), 3);

    filter.hour_start = 4;
    filter.hour_end = 10;
    assert_eq!(filter.apply(&table).len(), 2);

    let sunday_date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
    let sunday = TripFilter::all_of(&table).single_date(sunday_date);
    let view = sunday.apply(&table);
    assert_eq!(view.len(), 1);

    let summary = DashboardSummary::compute(&view);
    assert_eq!(summary.kpis.total_trips, 1);
    assert_eq!(summary.payments[0].label, "Unknown");
    assert_eq!(summary.top_zones[0].zone, "JFK Airport");

    let cards_only = TripFilter {
        payments: [PaymentType::Cash].into_iter().collect(),
        ..TripFilter::all_of(&table)
    };
    let empty = DashboardSummary::compute(&cards_only.apply(&table));
    assert!(empty.is_empty());
}

/// Serves fixture bytes by URL suffix and counts calls.
struct FixtureTransport {
    trips: Vec<u8>,
    zones: Vec<u8>,
    calls: Cell<usize>,
}

impl Transport for FixtureTransport {
    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        self.calls.set(self.calls.get() + 1);
        let body = if url.ends_with(".parquet") {
            self.trips.clone()
        } else {
            self.zones.clone()
        };
        Ok(Box::new(Cursor::new(body)))
    }
}

#[test]
fn test_fetch_and_build_downloads_once() {
    let source = Fixture::new();
    source.write_sources();
    let transport = FixtureTransport {
        trips: fs::read(source.trip_path()).unwrap(),
        zones: fs::read(source.zone_path()).unwrap(),
        calls: Cell::new(0),
    };

    let target = Fixture::new();
    let config = DashboardConfig::for_month(target.path().join("raw"), "2024-01");

    let table = fetch_and_build(&config, &transport).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(transport.calls.get(), 2);
    assert!(config.trip_path().ends_with("yellow_tripdata_2024-01.parquet"));
    assert!(config.trip_path().exists());
    assert!(config.zone_path().exists());

    let again = fetch_and_build(&config, &transport).unwrap();
    assert_eq!(transport.calls.get(), 2);
    assert_eq!(table, again);
}

#[test]
fn test_missing_trip_column_is_fatal() {
    let fx = Fixture::new();
    fx.write_trips(trips().drop("fare_amount").unwrap());
    fx.write_zones();

    let err = build_unified_table(&fx.trip_path(), &fx.zone_path()).unwrap_err();
    assert!(err.to_string().contains("fare_amount"));
}

#[test]
fn test_sub_second_trip_has_zero_duration_and_no_speed() {
    let fx = Fixture::new();
    let pickup = ts("2024-01-05T08:00:00");
    let dropoffs = [
        pickup + chrono::Duration::milliseconds(500),
        pickup + chrono::Duration::seconds(30),
    ];
    fx.write_trips(
        DataFrame::new(vec![
            naive_column("tpep_pickup_datetime", vec![Some(pickup); 2]),
            naive_column("tpep_dropoff_datetime", dropoffs.iter().copied().map(Some).collect()),
            Column::new("PULocationID".into(), [1i32, 1]),
            Column::new("DOLocationID".into(), [2i32, 2]),
            Column::new("trip_distance".into(), [0.2f64, 0.25]),
            Column::new("fare_amount".into(), [3.0f64, 3.5]),
            Column::new("total_amount".into(), [Some(4.0f64), Some(4.5)]),
            Column::new("payment_type".into(), [Some(2i64), Some(2)]),
        ])
        .unwrap(),
    );
    fx.write_zones();
    let table = build(&fx);

    assert_eq!(table.len(), 2);
    let instant = &table.rows()[0];
    assert_eq!(instant.dropoff_timestamp, dropoffs[0]);
    assert_eq!(instant.trip_duration_minutes, 0.0);
    assert!(instant.trip_speed_mph.is_none());

    let short = &table.rows()[1];
    assert_abs_diff_eq!(short.trip_duration_minutes, 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(short.trip_speed_mph.unwrap(), 30.0, epsilon = 1e-9);

    let summary = DashboardSummary::compute(&TripFilter::all_of(&table).apply(&table));
    assert_abs_diff_eq!(summary.kpis.avg_speed_mph.unwrap(), 30.0, epsilon = 1e-9);
}
