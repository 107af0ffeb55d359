use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`). Safe to call repeatedly.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

// -------- file operations with backoff --------
//
// Snapshot trees are often synced into place by other tools (cloud drives, AV
// scanners on Windows hosts); sharing violations and the like clear up after a
// short wait.

/// True for transient errors that are worth retrying.
fn is_retriable_io_error(e: &io::Error) -> bool {
    //   5 access denied, 32 sharing violation, 33 lock violation, 21 device not ready,
    //   1006 volume externally altered, 1117 device error, 1224 user-mapped section open
    matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 1006 | 1117 | 1224))
}

/// Run `op` up to `tries` times, sleeping a linearly growing delay between retriable failures.
fn retry<T>(what: &str, tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                tracing::debug!(attempt = i + 1, "{what} failed transiently: {e}");
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, format!("{what} failed"))))
}

pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry("open", tries, delay_ms, || File::open(path))
}

/// Create (truncating) a file.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry("create", tries, delay_ms, || File::create(path))
}

/// Open for appending, creating the file if needed.
pub fn append_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry("append", tries, delay_ms, || OpenOptions::new().create(true).append(true).open(path))
}

/// Remove a file. Succeeds if it doesn't exist.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    match retry("remove", tries, delay_ms, || fs::remove_file(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

/// Replace `dest` with `tmp`. Falls back to copy+remove when the rename keeps failing.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let (tries, delay_ms) = (20usize, 50u64);
    if dest.exists() {
        remove_with_backoff(dest, tries, delay_ms)?;
    }
    if retry("rename", tries, delay_ms, || fs::rename(tmp, dest)).is_ok() {
        return Ok(());
    }
    retry("copy", tries, delay_ms, || fs::copy(tmp, dest))
        .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
    remove_with_backoff(tmp, tries, delay_ms)
}
