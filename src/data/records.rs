//! Trip Record Module
//! Native row representation of the unified trip table and its closed enumerations.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;

/// Payment type, from the TLC `payment_type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PaymentType {
    CreditCard,
    Cash,
    NoCharge,
    Dispute,
    Unknown,
}

impl PaymentType {
    pub const ALL: [PaymentType; 5] = [
        PaymentType::CreditCard,
        PaymentType::Cash,
        PaymentType::NoCharge,
        PaymentType::Dispute,
        PaymentType::Unknown,
    ];

    /// Codes 1..=4 are known; anything else, including a missing code, is `Unknown`.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => PaymentType::CreditCard,
            Some(2) => PaymentType::Cash,
            Some(3) => PaymentType::NoCharge,
            Some(4) => PaymentType::Dispute,
            _ => PaymentType::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentType::CreditCard => "Credit Card",
            PaymentType::Cash => "Cash",
            PaymentType::NoCharge => "No Charge",
            PaymentType::Dispute => "Dispute",
            PaymentType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Day of week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// ISO weekday number, 1 = Monday .. 7 = Sunday.
    pub fn from_iso(n: u32) -> Option<Self> {
        match n {
            1..=7 => Some(Self::ALL[(n - 1) as usize]),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One admitted trip after cleaning, feature derivation and zone enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub pickup_timestamp: NaiveDateTime,
    pub dropoff_timestamp: NaiveDateTime,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub trip_distance: f64,
    pub fare_amount: f64,
    pub total_amount: Option<f64>,
    pub payment_type_code: Option<i64>,

    pub trip_duration_minutes: f64,
    pub pickup_hour: u32,
    pub pickup_day_of_week: DayOfWeek,
    /// Absent when the duration is zero.
    pub trip_speed_mph: Option<f64>,

    pub pickup_zone: Option<String>,
    pub pickup_borough: Option<String>,
    pub dropoff_zone: Option<String>,
    pub dropoff_borough: Option<String>,

    pub payment: PaymentType,
}

impl TripRecord {
    pub fn payment_label(&self) -> &'static str {
        self.payment.label()
    }

    pub fn pickup_date(&self) -> NaiveDate {
        self.pickup_timestamp.date()
    }
}

/// The unified table. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripTable {
    rows: Vec<TripRecord>,
}

impl TripTable {
    pub fn new(rows: Vec<TripRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TripRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last pickup calendar date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().map(TripRecord::pickup_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Distinct payment types present, in label order.
    pub fn payment_types(&self) -> Vec<PaymentType> {
        let present: BTreeSet<PaymentType> = self.rows.iter().map(|r| r.payment).collect();
        let mut types: Vec<PaymentType> = present.into_iter().collect();
        types.sort_by_key(|p| p.label());
        types
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    pub(crate) fn record(pickup: &str, payment: PaymentType, zone: Option<&str>) -> TripRecord {
        let pickup_timestamp = ts(pickup);
        let dropoff_timestamp = pickup_timestamp + chrono::Duration::minutes(10);
        TripRecord {
            pickup_timestamp,
            dropoff_timestamp,
            pickup_location_id: 1,
            dropoff_location_id: 2,
            trip_distance: 2.0,
            fare_amount: 10.0,
            total_amount: Some(14.0),
            payment_type_code: None,
            trip_duration_minutes: 10.0,
            pickup_hour: chrono::Timelike::hour(&pickup_timestamp),
            pickup_day_of_week: DayOfWeek::from_iso(
                chrono::Datelike::weekday(&pickup_timestamp).number_from_monday(),
            )
            .unwrap(),
            trip_speed_mph: Some(12.0),
            pickup_zone: zone.map(str::to_string),
            pickup_borough: None,
            dropoff_zone: None,
            dropoff_borough: None,
            payment,
        }
    }

    #[test]
    fn payment_codes_map_to_labels() {
        assert_eq!(PaymentType::from_code(Some(1)).label(), "Credit Card");
        assert_eq!(PaymentType::from_code(Some(2)).label(), "Cash");
        assert_eq!(PaymentType::from_code(Some(3)).label(), "No Charge");
        assert_eq!(PaymentType::from_code(Some(4)).label(), "Dispute");
        assert_eq!(PaymentType::from_code(Some(5)).label(), "Unknown");
        assert_eq!(PaymentType::from_code(Some(7)).label(), "Unknown");
        assert_eq!(PaymentType::from_code(Some(0)).label(), "Unknown");
        assert_eq!(PaymentType::from_code(None).label(), "Unknown");

        let mapped: Vec<PaymentType> = (1..=5).map(|c| PaymentType::from_code(Some(c))).collect();
        assert_eq!(mapped, PaymentType::ALL.to_vec());
    }

    #[test]
    fn weekday_table_is_monday_first() {
        assert_eq!(DayOfWeek::from_iso(1), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::from_iso(5).map(DayOfWeek::name), Some("Friday"));
        assert_eq!(DayOfWeek::from_iso(7), Some(DayOfWeek::Sunday));
        assert_eq!(DayOfWeek::from_iso(0), None);
        assert_eq!(DayOfWeek::from_iso(8), None);
        assert_eq!(DayOfWeek::Sunday.index(), 6);
    }

    #[test]
    fn table_bounds_and_labels() {
        let table = TripTable::new(vec![
            record("2024-01-05T04:00:00", PaymentType::Cash, None),
            record("2024-01-02T10:00:00", PaymentType::CreditCard, None),
            record("2024-01-09T23:00:00", PaymentType::Cash, None),
        ]);
        let (lo, hi) = table.date_bounds().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(
            table.payment_types(),
            vec![PaymentType::Cash, PaymentType::CreditCard]
        );
        assert!(TripTable::default().date_bounds().is_none());
    }
}
