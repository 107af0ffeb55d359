//! Progress reporting: a per-dataset spinner counting snapshot files as they are read.
//! The walk is lazy, so there is no total to draw a bar against.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Optional global MultiProgress so concurrent datasets each get their own line.
static GLOBAL_MP: OnceLock<Arc<MultiProgress>> = OnceLock::new();

/// Install a global MultiProgress used by all subsequently created spinners.
/// Additional calls are ignored.
pub fn set_global_multiprogress(mp: Arc<MultiProgress>) {
    let _ = GLOBAL_MP.set(mp);
}

fn new_spinner() -> ProgressBar {
    match GLOBAL_MP.get() {
        Some(mp) => mp.add(ProgressBar::new_spinner()),
        None => ProgressBar::new_spinner(),
    }
}

/// Spinner wrapper; a disabled scope swallows every call.
pub struct ProgressScope {
    pb: Option<ProgressBar>,
}

impl ProgressScope {
    pub fn files(label: impl Into<String>, enabled: bool) -> Self {
        if !enabled {
            return Self { pb: None };
        }
        let pb = new_spinner();
        let style = ProgressStyle::with_template("{spinner:.green} {msg} {pos} files  {per_sec}  elapsed: {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(label.into());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb: Some(pb) }
    }

    #[inline]
    pub fn inc_files(&self, delta: u64) {
        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }
    }

    pub fn finish(&self, msg: impl Into<String>) {
        if let Some(pb) = &self.pb {
            pb.finish_with_message(msg.into());
        }
    }
}
