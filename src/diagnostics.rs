//! Run-scoped diagnostics: every skip, drop and failure is recorded here with its
//! dataset, file and reason, and mirrored to `tracing`.

use crate::dataset::Dataset;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Unusable directory entry (non-numeric year, bad quarter file name, missing root).
    Traversal,
    Io,
    Parse,
    /// Expected container absent (or null).
    MissingContainer,
    /// Container present but of the wrong JSON type.
    ShapeMismatch,
    /// Required field absent on an entry; the entry is dropped.
    MissingField,
    /// Field present but not convertible (e.g. non-numeric pincode); the entry is dropped.
    Conversion,
    Sink,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::Traversal => "traversal",
            DiagnosticKind::Io => "io",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::MissingContainer => "missing_container",
            DiagnosticKind::ShapeMismatch => "shape_mismatch",
            DiagnosticKind::MissingField => "missing_field",
            DiagnosticKind::Conversion => "conversion",
            DiagnosticKind::Sink => "sink",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub dataset: Option<Dataset>,
    pub path: Option<PathBuf>,
    pub kind: DiagnosticKind,
    pub reason: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(d) = self.dataset {
            write!(f, " {d}")?;
        }
        if let Some(p) = &self.path {
            write!(f, " {}", p.display())?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Thread-safe collector shared by the walker, loader, extractors and sinks of one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(
        &self,
        dataset: Option<Dataset>,
        path: Option<&Path>,
        kind: DiagnosticKind,
        reason: impl Into<String>,
    ) {
        let d = Diagnostic { dataset, path: path.map(Path::to_path_buf), kind, reason: reason.into() };
        emit(&d, false);
        self.entries.lock().push(d);
    }

    /// Same as `report`, but always logged at `warn`. For problems that empty a whole
    /// dataset, such as a missing snapshot root.
    pub fn report_warn(
        &self,
        dataset: Option<Dataset>,
        path: Option<&Path>,
        kind: DiagnosticKind,
        reason: impl Into<String>,
    ) {
        let d = Diagnostic { dataset, path: path.map(Path::to_path_buf), kind, reason: reason.into() };
        emit(&d, true);
        self.entries.lock().push(d);
    }

    pub fn all(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn for_dataset(&self, dataset: Dataset) -> Vec<Diagnostic> {
        self.entries.lock().iter().filter(|d| d.dataset == Some(dataset)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn emit(d: &Diagnostic, loud: bool) {
    let dataset = d.dataset.map(Dataset::table_name).unwrap_or("-");
    let path = d.path.as_deref().map(|p| p.display().to_string()).unwrap_or_default();
    match d.kind {
        _ if loud => tracing::warn!(dataset, path = %path, kind = %d.kind, "{}", d.reason),
        DiagnosticKind::Traversal | DiagnosticKind::MissingContainer => {
            tracing::debug!(dataset, path = %path, kind = %d.kind, "{}", d.reason)
        }
        DiagnosticKind::Sink => tracing::error!(dataset, kind = %d.kind, "{}", d.reason),
        _ => tracing::warn!(dataset, path = %path, kind = %d.kind, "{}", d.reason),
    }
}
