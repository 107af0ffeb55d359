//! Per-dataset row collection. A dataset's rows are only handed to a sink once its
//! whole traversal has finished.

use crate::dataset::Dataset;
use crate::row::{ColumnTypeHints, ExtractedRow};
use std::collections::BTreeMap;

/// The complete set of rows destined for one table.
#[derive(Clone, Debug, PartialEq)]
pub struct RowBatch {
    pub dataset: Dataset,
    pub rows: Vec<ExtractedRow>,
}

impl RowBatch {
    pub fn empty(dataset: Dataset) -> Self {
        Self { dataset, rows: Vec::new() }
    }

    pub fn table_name(&self) -> &'static str {
        self.dataset.table_name()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.dataset.columns()
    }

    pub fn column_type_hints(&self) -> ColumnTypeHints {
        ColumnTypeHints::infer(&self.columns(), &self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows grouped by dataset. Rows are never deduplicated or reordered.
#[derive(Clone, Debug, Default)]
pub struct RecordAccumulator {
    batches: BTreeMap<Dataset, Vec<ExtractedRow>>,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, row: ExtractedRow) {
        self.batches.entry(row.dataset).or_default().push(row);
    }

    pub fn append_all(&mut self, rows: impl IntoIterator<Item = ExtractedRow>) {
        for row in rows {
            self.append(row);
        }
    }

    pub fn rows(&self, dataset: Dataset) -> &[ExtractedRow] {
        self.batches.get(&dataset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self, dataset: Dataset) -> usize {
        self.rows(dataset).len()
    }

    /// Take the dataset's rows out as a batch. A dataset that produced nothing
    /// finalizes to an empty batch.
    pub fn finalize(&mut self, dataset: Dataset) -> RowBatch {
        RowBatch { dataset, rows: self.batches.remove(&dataset).unwrap_or_default() }
    }
}

