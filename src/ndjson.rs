use crate::util::{append_with_backoff, create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered NDJSON writer over a file opened with retries.
pub struct NdjsonWriter {
    path: PathBuf,
    w: Option<BufWriter<File>>,
}

impl NdjsonWriter {
    /// Truncating writer, typically on a staging path later promoted with `finish_atomic`.
    pub fn create(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = create_with_backoff(path, 16, 50)?;
        Ok(Self::wrap(path, f, buf_bytes))
    }

    /// Writer positioned at the end of `path`, creating it if missing.
    pub fn append(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = append_with_backoff(path, 16, 50)?;
        Ok(Self::wrap(path, f, buf_bytes))
    }

    fn wrap(path: &Path, f: File, buf_bytes: usize) -> Self {
        Self { path: path.to_path_buf(), w: Some(BufWriter::with_capacity(buf_bytes.max(8 * 1024), f)) }
    }

    /// Serialize `value` as one line.
    pub fn write_record<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if let Some(w) = &mut self.w {
            serde_json::to_writer(&mut *w, value).with_context(|| format!("serialize into {}", self.path.display()))?;
            w.write_all(b"\n").with_context(|| format!("write {}", self.path.display()))?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Flushes and atomically promotes the staging file to `final_path`.
    pub fn finish_atomic(mut self, final_path: &Path) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        }
        replace_file_atomic_backoff(&self.path, final_path)
    }
}
