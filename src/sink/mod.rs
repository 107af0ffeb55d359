//! Table sinks: where finished batches land.
//!
//! A sink receives one complete batch per table together with the load mode and the
//! inferred column types. `Replace` must leave the table holding exactly the batch;
//! `Append` adds to whatever is there. A sink is free to ignore the hints.

mod memory;
mod ndjson;
mod sqlite;

pub use memory::{MemorySink, MemoryTable};
pub use ndjson::NdjsonTableSink;
pub use sqlite::SqliteTableSink;

use crate::accumulator::RowBatch;
use crate::dataset::LoadMode;
use crate::row::ColumnTypeHints;
use anyhow::Result;

pub trait TableSink {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()>;
}

impl<S: TableSink + ?Sized> TableSink for &mut S {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()> {
        (**self).write(table, batch, mode, hints)
    }
}

impl<S: TableSink + ?Sized> TableSink for Box<S> {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()> {
        (**self).write(table, batch, mode, hints)
    }
}
