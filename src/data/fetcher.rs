//! Resource Fetcher Module
//! Downloads a remote resource to local storage once; presence of the file is the cache key.

use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bytes copied per read while streaming a download.
pub const CHUNK_SIZE: usize = 1 << 20;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },
    #[error("http {status} fetching {url}")]
    Http { url: String, status: u16 },
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opens a streaming body for a URL.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError>;
}

/// Blocking HTTP(S) transport. No timeout is configured.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        match self.agent.get(url).call() {
            Ok(resp) => Ok(Box::new(resp.into_reader())),
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Http {
                url: url.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(t)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: t.to_string(),
            }),
        }
    }
}

/// What `ensure_local` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded { bytes: u64 },
}

/// Make sure `destination` holds the body of `url`.
///
/// An existing file is trusted as-is: no network access, no integrity check.
/// Otherwise parent directories are created and the body is streamed to a
/// sibling `.part` file in `CHUNK_SIZE` pieces, then renamed into place.
pub fn ensure_local(
    transport: &dyn Transport,
    url: &str,
    destination: &Path,
) -> Result<FetchOutcome, FetchError> {
    if destination.exists() {
        debug!("{} already present, skipping download", destination.display());
        return Ok(FetchOutcome::AlreadyPresent);
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| FetchError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    info!("Downloading {} -> {}", url, destination.display());
    let mut body = transport.get(url)?;

    let partial = partial_path(destination);
    let bytes = stream_to_file(&mut body, &partial).map_err(|source| {
        let _ = fs::remove_file(&partial);
        FetchError::Io {
            path: partial.clone(),
            source,
        }
    })?;
    fs::rename(&partial, destination).map_err(|source| FetchError::Io {
        path: destination.to_path_buf(),
        source,
    })?;

    info!("Downloaded {} bytes to {}", bytes, destination.display());
    Ok(FetchOutcome::Downloaded { bytes })
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

fn stream_to_file(body: &mut dyn Read, path: &Path) -> io::Result<u64> {
    let mut file = File::create(path)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        file.write_all(&buf[..n])?;
        total += n as u64;
    }
    file.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use tempfile::tempdir;

    struct CountingTransport {
        body: Vec<u8>,
        calls: Cell<usize>,
    }

    impl CountingTransport {
        fn new(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl Transport for CountingTransport {
        fn get(&self, _url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Box::new(Cursor::new(self.body.clone())))
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn get(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
            Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[test]
    fn existing_file_skips_network() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("zones.csv");
        fs::write(&dest, b"truncated").unwrap();

        let transport = CountingTransport::new(b"fresh body");
        let outcome = ensure_local(&transport, "http://example.invalid/z.csv", &dest).unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
        assert_eq!(transport.calls.get(), 0);
        // never repaired
        assert_eq!(fs::read(&dest).unwrap(), b"truncated");
    }

    #[test]
    fn missing_file_is_downloaded_into_new_directories() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested").join("trips.parquet");
        let body: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();

        let transport = CountingTransport::new(&body);
        let outcome = ensure_local(&transport, "http://example.invalid/t", &dest).unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Downloaded {
                bytes: body.len() as u64
            }
        );
        assert_eq!(transport.calls.get(), 1);
        assert_eq!(fs::read(&dest).unwrap(), body);
        assert!(!partial_path(&dest).exists());

        let again = ensure_local(&transport, "http://example.invalid/t", &dest).unwrap();
        assert_eq!(again, FetchOutcome::AlreadyPresent);
        assert_eq!(transport.calls.get(), 1);
    }

    #[test]
    fn http_failure_is_fatal_and_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("trips.parquet");

        let err = ensure_local(&FailingTransport, "http://example.invalid/t", &dest).unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 404, .. }));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }
}
