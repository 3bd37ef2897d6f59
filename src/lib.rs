//! NYC Yellow Taxi Dashboard
//!
//! Downloads one month of TLC yellow-taxi trips plus the zone lookup table,
//! builds a cleaned and enriched trip table, and serves filtered views of it
//! to an interactive dashboard and a headless chart export.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod report;
pub mod stats;
