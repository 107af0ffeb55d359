use super::TableSink;
use crate::accumulator::RowBatch;
use crate::dataset::LoadMode;
use crate::ndjson::NdjsonWriter;
use crate::row::ColumnTypeHints;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ColumnSpec<'a> {
    name: &'a str,
    sql_type: &'static str,
}

/// Writes each table as `<dir>/<table>.ndjson` (one object per row,
/// keyed by column name) plus `<dir>/<table>.columns.json` listing columns and SQL types in order.
#[derive(Clone, Debug)]
pub struct NdjsonTableSink {
    dir: PathBuf,
    write_buffer_bytes: usize,
}

impl NdjsonTableSink {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("create output dir {}", dir.display()))?;
        Ok(Self { dir, write_buffer_bytes: 256 * 1024 })
    }

    pub fn with_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.ndjson"))
    }

    pub fn columns_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.columns.json"))
    }

    fn write_columns(&self, table: &str, hints: &ColumnTypeHints) -> Result<()> {
        let specs: Vec<ColumnSpec<'_>> = hints.iter().map(|(name, t)| ColumnSpec { name, sql_type: t.sql_type() }).collect();
        let staging = self.dir.join(format!(".{table}.columns.json.tmp"));
        let body = serde_json::to_vec_pretty(&specs)?;
        fs::write(&staging, body).with_context(|| format!("write {}", staging.display()))?;
        crate::util::replace_file_atomic_backoff(&staging, &self.columns_path(table))
    }
}

impl TableSink for NdjsonTableSink {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()> {
        let final_path = self.table_path(table);
        match mode {
            LoadMode::Replace => {
                let staging = self.dir.join(format!(".{table}.ndjson.tmp"));
                let mut w = NdjsonWriter::create(&staging, self.write_buffer_bytes)
                    .with_context(|| format!("create {}", staging.display()))?;
                for row in &batch.rows {
                    w.write_record(&row.to_json_object())?;
                }
                w.finish_atomic(&final_path)?;
            }
            LoadMode::Append => {
                let mut w = NdjsonWriter::append(&final_path, self.write_buffer_bytes)
                    .with_context(|| format!("open {} for append", final_path.display()))?;
                for row in &batch.rows {
                    w.write_record(&row.to_json_object())?;
                }
                w.finish()?;
            }
        }
        self.write_columns(table, hints)
            .with_context(|| format!("column description for {table}"))?;
        tracing::debug!(table, rows = batch.len(), mode = %mode, path = %final_path.display(), "ndjson table written");
        Ok(())
    }
}
