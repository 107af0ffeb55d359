mod config;
mod coordinate;
mod dataset;
mod paths;
mod loader;
mod json_utils;

mod extract;
mod row;
mod accumulator;
mod diagnostics;

mod sink;
mod ndjson;
mod progress;
mod concurrency;
mod util;
mod pipeline;

pub use crate::config::{ExtractOptions, ENV_CONCURRENCY, ENV_DATASETS, ENV_DATA_ROOT, ENV_TOP_DISTRICT_KEYS};
pub use crate::coordinate::{parse_year, Quarter, SnapshotCoordinate, YearError};
pub use crate::dataset::{Category, Dataset, Granularity, LoadMode};
pub use crate::pipeline::{ExtractionRun, PulseETL, RunReport, TableOutcome};

// walker and loader, for callers driving their own traversal
pub use crate::paths::{walk_snapshots, SnapshotFile};
pub use crate::loader::{load_snapshot, LoadError};

// shape extraction and the typed JSON accessors it is built on
pub use crate::extract::{Extraction, Issue, ShapeExtractor, DEFAULT_TOP_DISTRICT_KEYS};
pub use crate::json_utils::{get_path, list_at, lookup, object_at, FieldError, JsonKind, RawSnapshot, ShapeError};

pub use crate::row::{ColumnType, ColumnTypeHints, ExtractedRow, Scalar};
pub use crate::accumulator::{RecordAccumulator, RowBatch};
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

// export sinks
pub use crate::sink::{MemorySink, MemoryTable, NdjsonTableSink, SqliteTableSink, TableSink};

// expose progress so the binary can share one MultiProgress across datasets
pub use crate::progress::set_global_multiprogress;

//export robust file ops and tracing init from util so binaries can import from crate root.
pub use crate::util::{init_tracing_once, open_with_backoff, create_with_backoff, remove_with_backoff, replace_file_atomic_backoff};
