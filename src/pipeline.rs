use crate::accumulator::RecordAccumulator;
use crate::concurrency::for_each_dataset_limited;
use crate::config::ExtractOptions;
use crate::dataset::{Dataset, LoadMode};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::extract::{Extraction, ShapeExtractor};
use crate::loader::{load_snapshot, LoadError};
use crate::paths::walk_snapshots;
use crate::progress::ProgressScope;
use crate::row::ExtractedRow;
use crate::sink::TableSink;
use crate::util::init_tracing_once;
use std::path::Path;

#[derive(Clone, Debug, Default)]
pub struct PulseETL {
    pub(crate) opts: ExtractOptions,
}

/// Everything one extraction pass produced: rows grouped by dataset, plus every
/// skip and drop recorded along the way. `datasets` lists the datasets that were
/// walked, in load order; only those tables are written by `load`.
#[derive(Debug)]
pub struct ExtractionRun {
    pub datasets: Vec<Dataset>,
    pub accumulator: RecordAccumulator,
    pub diagnostics: Diagnostics,
}

/// What happened to one table during `run`.
#[derive(Clone, Debug, PartialEq)]
pub struct TableOutcome {
    pub dataset: Dataset,
    pub table: &'static str,
    pub rows: usize,
    pub mode: LoadMode,
    pub error: Option<String>,
}

impl TableOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub tables: Vec<TableOutcome>,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn failed_tables(&self) -> Vec<&TableOutcome> {
        self.tables.iter().filter(|t| !t.is_ok()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().filter(|t| t.is_ok()).map(|t| t.rows).sum()
    }

    pub fn outcome(&self, dataset: Dataset) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.dataset == dataset)
    }
}

impl PulseETL {
    pub fn new() -> Self {
        Self { opts: ExtractOptions::default() }
    }

    pub fn from_options(opts: ExtractOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.opts
    }

    // -------- Builder methods --------
    pub fn data_root(mut self, root: impl AsRef<Path>) -> Self { self.opts = self.opts.with_data_root(root); self }
    pub fn dataset_root(mut self, dataset: Dataset, root: impl AsRef<Path>) -> Self { self.opts = self.opts.with_dataset_root(dataset, root); self }
    pub fn datasets<I>(mut self, datasets: I) -> Self where I: IntoIterator<Item = Dataset> { self.opts = self.opts.with_datasets(datasets); self }
    pub fn top_district_keys<I, S>(mut self, keys: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_top_district_keys(keys); self }
    pub fn load_mode(mut self, dataset: Dataset, mode: LoadMode) -> Self { self.opts = self.opts.with_load_mode(dataset, mode); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn dataset_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_dataset_concurrency(n); self }
    pub fn merge_env(mut self) -> Self { self.opts = self.opts.merge_env(); self }

    // -------- Operations --------

    /// Walk and extract every selected dataset. Never fails: unreadable files,
    /// malformed JSON and unexpected shapes end up in the diagnostics.
    pub fn extract(&self) -> ExtractionRun {
        init_tracing_once();
        let diagnostics = Diagnostics::new();
        let per_dataset = for_each_dataset_limited(&self.opts.datasets, self.opts.dataset_concurrency, |dataset| {
            self.collect_rows(dataset, &diagnostics)
        });
        let mut accumulator = RecordAccumulator::new();
        for rows in per_dataset {
            accumulator.append_all(rows);
        }
        ExtractionRun { datasets: self.opts.datasets.clone(), accumulator, diagnostics }
    }

    /// Extract a single dataset, regardless of the selection.
    pub fn extract_dataset(&self, dataset: Dataset) -> ExtractionRun {
        init_tracing_once();
        let diagnostics = Diagnostics::new();
        let mut accumulator = RecordAccumulator::new();
        accumulator.append_all(self.collect_rows(dataset, &diagnostics));
        ExtractionRun { datasets: vec![dataset], accumulator, diagnostics }
    }

    /// Extract everything, then write each selected table to `sink` in dataset order.
    pub fn run<S: TableSink + ?Sized>(&self, sink: &mut S) -> RunReport {
        let extracted = self.extract();
        self.load(extracted, sink)
    }

    /// Write an already extracted run to `sink`, one table per dataset the run walked.
    /// Tables the run never extracted are left alone. A table that fails to write is
    /// recorded and the remaining tables are still written.
    pub fn load<S: TableSink + ?Sized>(&self, run: ExtractionRun, sink: &mut S) -> RunReport {
        init_tracing_once();
        let ExtractionRun { datasets, mut accumulator, diagnostics } = run;
        let mut tables = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            let batch = accumulator.finalize(dataset);
            let hints = batch.column_type_hints();
            let mode = self.opts.load_mode_for(dataset);
            let table = dataset.table_name();
            let error = match sink.write(table, &batch, mode, &hints) {
                Ok(()) => {
                    tracing::info!(table, rows = batch.len(), mode = %mode, "table loaded");
                    None
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    diagnostics.report(Some(dataset), None, DiagnosticKind::Sink, format!("write failed: {reason}"));
                    Some(reason)
                }
            };
            tables.push(TableOutcome { dataset, table, rows: batch.len(), mode, error });
        }
        RunReport { tables, diagnostics }
    }

    /// Walk one dataset's tree: load each file, extract, and forward every problem
    /// to `diag` against the file it came from.
    fn collect_rows(&self, dataset: Dataset, diag: &Diagnostics) -> Vec<ExtractedRow> {
        let root = self.opts.root_for(dataset);
        let extractor = ShapeExtractor::for_dataset(dataset, &self.opts.top_district_keys);
        let label = match &self.opts.progress_label {
            Some(prefix) => format!("{prefix} {dataset}"),
            None => dataset.to_string(),
        };
        let progress = ProgressScope::files(label, self.opts.progress);

        let mut rows = Vec::new();
        let mut files = 0usize;
        for file in walk_snapshots(&root, dataset, diag) {
            files += 1;
            progress.inc_files(1);
            let snapshot = match load_snapshot(&file.path, self.opts.read_buffer_bytes) {
                Ok(s) => s,
                Err(LoadError::Io { source, .. }) => {
                    diag.report(Some(dataset), Some(file.path.as_path()), DiagnosticKind::Io, format!("{source}; file skipped"));
                    continue;
                }
                Err(LoadError::Parse { source, .. }) => {
                    diag.report(Some(dataset), Some(file.path.as_path()), DiagnosticKind::Parse, format!("malformed JSON: {source}; file skipped"));
                    continue;
                }
            };
            let Extraction { rows: extracted, issues } = extractor.extract(&snapshot, &file.coordinate);
            for issue in issues {
                diag.report(Some(dataset), Some(file.path.as_path()), issue.kind, issue.detail);
            }
            rows.extend(extracted);
        }
        progress.finish(format!("{dataset}: {} rows", rows.len()));
        tracing::info!(dataset = dataset.table_name(), files, rows = rows.len(), root = %root.display(), "Processed {} rows for {}", rows.len(), dataset);
        rows
    }
}
