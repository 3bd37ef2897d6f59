//! Table Cache Module
//! Memoizes the unified table for the process lifetime, keyed by the identity of
//! the two source files.

use crate::data::loader::LoaderError;
use crate::data::records::TripTable;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Identity of one source file: path, size and modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    pub fn of(path: &Path) -> Result<Self, LoaderError> {
        let meta = std::fs::metadata(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Cache key: both source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub trips: FileStamp,
    pub zones: FileStamp,
}

impl SourceFingerprint {
    pub fn of(trip_path: &Path, zone_path: &Path) -> Result<Self, LoaderError> {
        Ok(Self {
            trips: FileStamp::of(trip_path)?,
            zones: FileStamp::of(zone_path)?,
        })
    }
}

/// Lazily built, shared, immutable unified table.
///
/// The lock is held across the build so concurrent callers share one build.
#[derive(Default)]
pub struct TableCache {
    slot: Mutex<Option<(SourceFingerprint, Arc<TripTable>)>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table if the sources are unchanged, otherwise run `build`.
    pub fn get_or_build<F>(
        &self,
        trip_path: &Path,
        zone_path: &Path,
        build: F,
    ) -> Result<Arc<TripTable>, LoaderError>
    where
        F: FnOnce(&Path, &Path) -> Result<TripTable, LoaderError>,
    {
        let fingerprint = SourceFingerprint::of(trip_path, zone_path)?;
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((cached, table)) = slot.as_ref() {
            if *cached == fingerprint {
                debug!("Unified table cache hit ({} rows)", table.len());
                return Ok(Arc::clone(table));
            }
            info!("Source files changed, rebuilding unified table");
        }

        let table = Arc::new(build(trip_path, zone_path)?);
        *slot = Some((fingerprint, Arc::clone(&table)));
        Ok(table)
    }

    #[cfg(test)]
    fn cached(&self) -> Option<Arc<TripTable>> {
        self.slot
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|(_, t)| Arc::clone(t)))
    }
}
