use super::TableSink;
use crate::accumulator::RowBatch;
use crate::dataset::LoadMode;
use crate::row::{ColumnTypeHints, Scalar};
use anyhow::{Context, Result};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Scalar::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Scalar::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Scalar::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// Relational sink backed by a SQLite database file.
///
/// Every `write` opens its own connection and does all its work in one transaction,
/// so a failed table leaves the previous contents in place and the connection is
/// closed on every exit path.
#[derive(Clone, Debug)]
pub struct SqliteTableSink {
    path: PathBuf,
}

impl SqliteTableSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags)
            .with_context(|| format!("open sqlite database {}", self.path.display()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(conn)
    }
}

/// Double-quoted SQL identifier.
fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(table: &str, hints: &ColumnTypeHints, if_not_exists: bool) -> String {
    let cols: Vec<String> = hints.iter().map(|(c, t)| format!("{} {}", ident(c), t.sql_type())).collect();
    let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
    format!("CREATE TABLE {guard}{} ({})", ident(table), cols.join(", "))
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let names: Vec<String> = columns.iter().map(|c| ident(c)).collect();
    let slots: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!("INSERT INTO {} ({}) VALUES ({})", ident(table), names.join(", "), slots.join(", "))
}

impl TableSink for SqliteTableSink {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().context("begin transaction")?;
        match mode {
            LoadMode::Replace => {
                tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", ident(table)))
                    .with_context(|| format!("drop {table}"))?;
                tx.execute_batch(&create_table_sql(table, hints, false))
                    .with_context(|| format!("create {table}"))?;
            }
            LoadMode::Append => {
                tx.execute_batch(&create_table_sql(table, hints, true))
                    .with_context(|| format!("create {table}"))?;
            }
        }
        {
            let mut stmt = tx
                .prepare(&insert_sql(table, &batch.columns()))
                .with_context(|| format!("prepare insert into {table}"))?;
            for row in &batch.rows {
                stmt.execute(params_from_iter(row.values()))
                    .with_context(|| format!("insert into {table} ({})", row.coordinate))?;
            }
        }
        tx.commit().with_context(|| format!("commit {table}"))?;
        tracing::debug!(table, rows = batch.len(), mode = %mode, db = %self.path.display(), "sqlite table written");
        Ok(())
    }
}
