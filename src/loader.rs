use crate::json_utils::RawSnapshot;
use crate::util::open_with_backoff;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and parse one snapshot file. Transient open failures are retried; anything else
/// comes back as a typed error for the caller to report and skip.
pub fn load_snapshot(path: &Path, read_buf_bytes: usize) -> Result<RawSnapshot, LoadError> {
    let file = open_with_backoff(path, 16, 50)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let reader = BufReader::with_capacity(read_buf_bytes.max(8 * 1024), file);
    serde_json::from_reader(reader).map_err(|e| {
        if e.is_io() {
            LoadError::Io { path: path.to_path_buf(), source: io::Error::from(e) }
        } else {
            LoadError::Parse { path: path.to_path_buf(), source: e }
        }
    })
}
