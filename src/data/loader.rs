//! Trip Data Loader Module
//! Reads the trip-records Parquet file and the zone-lookup CSV with Polars,
//! cleans, derives features, joins zone names and materializes native rows.

use crate::config::DashboardConfig;
use crate::data::fetcher::{ensure_local, FetchError, Transport};
use crate::data::records::{DayOfWeek, PaymentType, TripRecord, TripTable};
use chrono::{DateTime, NaiveDateTime};
use log::info;
use polars::prelude::*;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source and derived column names.
pub mod columns {
    pub const PICKUP: &str = "tpep_pickup_datetime";
    pub const DROPOFF: &str = "tpep_dropoff_datetime";
    pub const PICKUP_LOCATION: &str = "PULocationID";
    pub const DROPOFF_LOCATION: &str = "DOLocationID";
    pub const DISTANCE: &str = "trip_distance";
    pub const FARE: &str = "fare_amount";
    pub const TOTAL: &str = "total_amount";
    pub const PAYMENT_TYPE: &str = "payment_type";

    pub const ZONE_LOCATION: &str = "LocationID";
    pub const ZONE_NAME: &str = "Zone";
    pub const ZONE_BOROUGH: &str = "Borough";

    pub const DURATION: &str = "trip_duration_minutes";
    pub const HOUR: &str = "pickup_hour";
    pub const WEEKDAY: &str = "pickup_weekday";
    pub const SPEED: &str = "trip_speed_mph";
    pub const PICKUP_ZONE: &str = "pickup_zone";
    pub const PICKUP_BOROUGH: &str = "pickup_borough";
    pub const DROPOFF_ZONE: &str = "dropoff_zone";
    pub const DROPOFF_BOROUGH: &str = "dropoff_borough";

    pub(crate) const ROW_INDEX: &str = "__row";

    pub const TRIP_INPUTS: [&str; 8] = [
        PICKUP,
        DROPOFF,
        PICKUP_LOCATION,
        DROPOFF_LOCATION,
        DISTANCE,
        FARE,
        TOTAL,
        PAYMENT_TYPE,
    ];

    /// A row missing any of these is dropped.
    pub const CRITICAL: [&str; 5] = [PICKUP, DROPOFF, PICKUP_LOCATION, DROPOFF_LOCATION, FARE];

    pub const ZONE_INPUTS: [&str; 3] = [ZONE_LOCATION, ZONE_NAME, ZONE_BOROUGH];
}

use columns::*;

/// Upper bound (inclusive) for an admitted fare.
pub const MAX_FARE: f64 = 500.0;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Unexpected null in column {0}")]
    UnexpectedNull(&'static str),
    #[error("Value out of range in column {column}: {value}")]
    OutOfRange { column: &'static str, value: i64 },
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Read the trip-records Parquet file.
pub fn read_trips(path: &Path) -> Result<DataFrame, LoaderError> {
    let file = File::open(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file).finish()?;
    require_columns(&df, &TRIP_INPUTS)?;
    Ok(df)
}

/// Read the zone-lookup CSV.
pub fn read_zones(path: &Path) -> Result<DataFrame, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;
    require_columns(&df, &ZONE_INPUTS)?;
    Ok(df)
}

fn require_columns(df: &DataFrame, names: &[&str]) -> Result<(), LoaderError> {
    for name in names {
        if df.column(name).is_err() {
            return Err(LoaderError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

fn admitted_rows() -> Expr {
    let not_null = CRITICAL
        .iter()
        .map(|c| col(*c).is_not_null())
        .reduce(|acc, e| acc.and(e))
        .unwrap_or_else(|| lit(true));

    not_null
        .and(col(DISTANCE).gt(lit(0.0)))
        .and(col(FARE).gt(lit(0.0)))
        .and(col(FARE).lt_eq(lit(MAX_FARE)))
        .and(col(DROPOFF).gt(col(PICKUP)))
}

/// Zone lookup projected onto one role (pickup or dropoff).
fn zones_for_role(
    zones: &LazyFrame,
    key: &str,
    zone_alias: &str,
    borough_alias: &str,
) -> LazyFrame {
    zones.clone().select([
        col(ZONE_LOCATION).cast(DataType::Int64).alias(key),
        col(ZONE_NAME).cast(DataType::String).alias(zone_alias),
        col(ZONE_BOROUGH).cast(DataType::String).alias(borough_alias),
    ])
}

/// Clean, derive and enrich. Row order of the admitted trips is preserved.
pub fn clean_and_enrich(trips: DataFrame, zones: DataFrame) -> Result<DataFrame, LoaderError> {
    require_columns(&trips, &TRIP_INPUTS)?;
    require_columns(&zones, &ZONE_INPUTS)?;

    let micros = DataType::Datetime(TimeUnit::Microseconds, None);
    let zones = zones.lazy();

    let df = trips
        .lazy()
        .select([
            col(PICKUP),
            col(DROPOFF),
            col(PICKUP_LOCATION).cast(DataType::Int64),
            col(DROPOFF_LOCATION).cast(DataType::Int64),
            col(DISTANCE).cast(DataType::Float64),
            col(FARE).cast(DataType::Float64),
            col(TOTAL).cast(DataType::Float64),
            col(PAYMENT_TYPE).cast(DataType::Int64),
        ])
        .with_row_index(ROW_INDEX, None)
        .filter(admitted_rows())
        // whole seconds, so sub-second trips have zero duration
        .with_columns([
            ((col(DROPOFF) - col(PICKUP)).dt().total_seconds().cast(DataType::Float64)
                / lit(60.0))
            .alias(DURATION),
            col(PICKUP).dt().hour().cast(DataType::Int32).alias(HOUR),
            col(PICKUP).dt().weekday().cast(DataType::Int32).alias(WEEKDAY),
        ])
        .with_columns([
            when(col(DURATION).gt(lit(0.0)))
                .then(col(DISTANCE) / (col(DURATION) / lit(60.0)))
                .otherwise(lit(NULL))
                .cast(DataType::Float64)
                .alias(SPEED),
            col(PICKUP).cast(micros.clone()),
            col(DROPOFF).cast(micros),
        ])
        .left_join(
            zones_for_role(&zones, PICKUP_LOCATION, PICKUP_ZONE, PICKUP_BOROUGH),
            col(PICKUP_LOCATION),
            col(PICKUP_LOCATION),
        )
        .left_join(
            zones_for_role(&zones, DROPOFF_LOCATION, DROPOFF_ZONE, DROPOFF_BOROUGH),
            col(DROPOFF_LOCATION),
            col(DROPOFF_LOCATION),
        )
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?;

    Ok(df)
}

fn micros_to_naive(column: &'static str, us: i64) -> Result<NaiveDateTime, LoaderError> {
    DateTime::from_timestamp_micros(us)
        .map(|dt| dt.naive_utc())
        .ok_or(LoaderError::OutOfRange { column, value: us })
}

/// Convert the enriched frame into native rows, mapping payment codes and weekdays
/// through their closed enumerations.
pub fn materialize(mut df: DataFrame) -> Result<TripTable, LoaderError> {
    df.as_single_chunk_par();

    let pickup = df.column(PICKUP)?.cast(&DataType::Int64)?;
    let pickup = pickup.i64()?;
    let dropoff = df.column(DROPOFF)?.cast(&DataType::Int64)?;
    let dropoff = dropoff.i64()?;
    let pu = df.column(PICKUP_LOCATION)?.i64()?;
    let dl = df.column(DROPOFF_LOCATION)?.i64()?;
    let distance = df.column(DISTANCE)?.f64()?;
    let fare = df.column(FARE)?.f64()?;
    let total = df.column(TOTAL)?.f64()?;
    let payment = df.column(PAYMENT_TYPE)?.i64()?;
    let duration = df.column(DURATION)?.f64()?;
    let hour = df.column(HOUR)?.i32()?;
    let weekday = df.column(WEEKDAY)?.i32()?;
    let speed = df.column(SPEED)?.f64()?;
    let pickup_zone = df.column(PICKUP_ZONE)?.str()?;
    let pickup_borough = df.column(PICKUP_BOROUGH)?.str()?;
    let dropoff_zone = df.column(DROPOFF_ZONE)?.str()?;
    let dropoff_borough = df.column(DROPOFF_BOROUGH)?.str()?;

    let rows = (0..df.height())
        .into_par_iter()
        .map(|i| {
            let pickup_us = pickup.get(i).ok_or(LoaderError::UnexpectedNull(PICKUP))?;
            let dropoff_us = dropoff.get(i).ok_or(LoaderError::UnexpectedNull(DROPOFF))?;
            let hour = hour.get(i).ok_or(LoaderError::UnexpectedNull(HOUR))?;
            let iso_day = weekday.get(i).ok_or(LoaderError::UnexpectedNull(WEEKDAY))?;
            let pickup_day_of_week = u32::try_from(iso_day)
                .ok()
                .and_then(DayOfWeek::from_iso)
                .ok_or(LoaderError::OutOfRange {
                    column: WEEKDAY,
                    value: iso_day as i64,
                })?;
            let payment_type_code = payment.get(i);

            Ok(TripRecord {
                pickup_timestamp: micros_to_naive(PICKUP, pickup_us)?,
                dropoff_timestamp: micros_to_naive(DROPOFF, dropoff_us)?,
                pickup_location_id: pu.get(i).ok_or(LoaderError::UnexpectedNull(PICKUP_LOCATION))?,
                dropoff_location_id: dl
                    .get(i)
                    .ok_or(LoaderError::UnexpectedNull(DROPOFF_LOCATION))?,
                trip_distance: distance.get(i).ok_or(LoaderError::UnexpectedNull(DISTANCE))?,
                fare_amount: fare.get(i).ok_or(LoaderError::UnexpectedNull(FARE))?,
                total_amount: total.get(i),
                payment_type_code,
                trip_duration_minutes: duration
                    .get(i)
                    .ok_or(LoaderError::UnexpectedNull(DURATION))?,
                pickup_hour: u32::try_from(hour).map_err(|_| LoaderError::OutOfRange {
                    column: HOUR,
                    value: hour as i64,
                })?,
                pickup_day_of_week,
                trip_speed_mph: speed.get(i),
                pickup_zone: pickup_zone.get(i).map(str::to_string),
                pickup_borough: pickup_borough.get(i).map(str::to_string),
                dropoff_zone: dropoff_zone.get(i).map(str::to_string),
                dropoff_borough: dropoff_borough.get(i).map(str::to_string),
                payment: PaymentType::from_code(payment_type_code),
            })
        })
        .collect::<Result<Vec<_>, LoaderError>>()?;

    Ok(TripTable::new(rows))
}

/// Build the unified table from the two local resources.
pub fn build_unified_table(trip_path: &Path, zone_path: &Path) -> Result<TripTable, LoaderError> {
    let trips = read_trips(trip_path)?;
    let zones = read_zones(zone_path)?;
    let raw_rows = trips.height();
    info!(
        "Loaded {} raw trips from {} and {} zones from {}",
        raw_rows,
        trip_path.display(),
        zones.height(),
        zone_path.display()
    );

    let enriched = clean_and_enrich(trips, zones)?;
    let table = materialize(enriched)?;
    info!(
        "Admitted {} of {} trips ({} dropped by validity rules)",
        table.len(),
        raw_rows,
        raw_rows.saturating_sub(table.len())
    );
    Ok(table)
}

/// Download any missing resource, then build the unified table.
pub fn fetch_and_build(
    config: &DashboardConfig,
    transport: &dyn Transport,
) -> Result<TripTable, LoaderError> {
    let trip_path = config.trip_path();
    let zone_path = config.zone_path();
    ensure_local(transport, &config.trip_url, &trip_path)?;
    ensure_local(transport, &config.zone_url, &zone_path)?;
    build_unified_table(&trip_path, &zone_path)
}
