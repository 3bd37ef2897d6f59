//! Trip Filter Module
//! Narrows the unified table to the rows matching the side-panel selections.

use crate::data::records::{PaymentType, TripRecord, TripTable};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeSet;

pub const MAX_HOUR: u32 = 23;

/// Side-panel selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripFilter {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hour_start: u32,
    pub hour_end: u32,
    /// Empty means every payment type.
    pub payments: BTreeSet<PaymentType>,
}

impl TripFilter {
    /// Full date span, all hours, every payment type present in the table.
    pub fn all_of(table: &TripTable) -> Self {
        let (start_date, end_date) = table
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            start_date,
            end_date,
            hour_start: 0,
            hour_end: MAX_HOUR,
            payments: table.payment_types().into_iter().collect(),
        }
    }

    /// One calendar day.
    pub fn single_date(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self.end_date = date;
        self
    }

    fn date_interval(&self) -> (NaiveDate, NaiveDate) {
        if self.start_date <= self.end_date {
            (self.start_date, self.end_date)
        } else {
            (self.end_date, self.start_date)
        }
    }

    fn hour_interval(&self) -> (u32, u32) {
        let a = self.hour_start.min(MAX_HOUR);
        let b = self.hour_end.min(MAX_HOUR);
        (a.min(b), a.max(b))
    }

    pub fn matches(&self, row: &TripRecord) -> bool {
        let (first, last) = self.date_interval();
        let (lo, hi) = self.hour_interval();
        let date = row.pickup_date();
        date >= first
            && date <= last
            && row.pickup_hour >= lo
            && row.pickup_hour <= hi
            && (self.payments.is_empty() || self.payments.contains(&row.payment))
    }

    /// Matching rows as a view over `table`. The table is never modified.
    pub fn apply<'a>(&self, table: &'a TripTable) -> TripView<'a> {
        let indices = table
            .rows()
            .par_iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(i, _)| i)
            .collect();
        TripView { table, indices }
    }
}

/// A filtered, read-only selection of rows.
#[derive(Debug, Clone)]
pub struct TripView<'a> {
    table: &'a TripTable,
    indices: Vec<usize>,
}

impl<'a> TripView<'a> {
    pub fn all(table: &'a TripTable) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TripRecord> + '_ {
        let rows = self.table.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn par_iter(&self) -> impl ParallelIterator<Item = &'a TripRecord> + '_ {
        let rows = self.table.rows();
        self.indices.par_iter().map(move |&i| &rows[i])
    }
}
