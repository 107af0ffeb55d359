use super::TableSink;
use crate::accumulator::RowBatch;
use crate::dataset::LoadMode;
use crate::row::{ColumnTypeHints, Scalar};
use anyhow::Result;
use std::collections::BTreeMap;

/// One in-memory table as last written.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
    pub hints: ColumnTypeHints,
    pub last_mode: LoadMode,
    pub writes: usize,
}

impl MemoryTable {
    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Vec<Scalar> {
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => self.rows.iter().map(|r| r[idx].clone()).collect(),
            None => Vec::new(),
        }
    }
}

/// In-process tables keyed by name. Used by tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    tables: BTreeMap<String, MemoryTable>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

impl TableSink for MemorySink {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()> {
        let rows: Vec<Vec<Scalar>> = batch.rows.iter().map(|r| r.values()).collect();
        let columns: Vec<String> = batch.columns().iter().map(|c| c.to_string()).collect();
        if mode == LoadMode::Append {
            if let Some(t) = self.tables.get_mut(table) {
                t.rows.extend(rows);
                t.hints = hints.clone();
                t.last_mode = mode;
                t.writes += 1;
                return Ok(());
            }
        }
        let writes = self.tables.get(table).map(|t| t.writes).unwrap_or(0) + 1;
        self.tables.insert(table.to_string(), MemoryTable { columns, rows, hints: hints.clone(), last_mode: mode, writes });
        Ok(())
    }
}
