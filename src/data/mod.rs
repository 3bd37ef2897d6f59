//! Data module - download, loading, cleaning and filtering of trip records

pub mod cache;
pub mod fetcher;
pub mod filter;
pub mod loader;
pub mod records;

pub use cache::TableCache;
pub use fetcher::{ensure_local, FetchError, FetchOutcome, Transport, UreqTransport};
pub use filter::{TripFilter, TripView};
pub use loader::{build_unified_table, fetch_and_build, LoaderError};
pub use records::{DayOfWeek, PaymentType, TripRecord, TripTable};
