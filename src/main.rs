use anyhow::{bail, Result};
use indicatif::MultiProgress;
use pulse_etl::{init_tracing_once, set_global_multiprogress, NdjsonTableSink, PulseETL, RunReport, SqliteTableSink};
use std::sync::Arc;

const DEFAULT_SQLITE_OUT: &str = "pulse.db";
const DEFAULT_NDJSON_OUT: &str = "pulse_tables";

const ENV_SINK: &str = "PULSE_ETL_SINK";
const ENV_OUT: &str = "PULSE_ETL_OUT";

fn main() -> Result<()> {
    init_tracing_once();
    set_global_multiprogress(Arc::new(MultiProgress::new()));

    // single-threaded unless PULSE_ETL_CONCURRENCY raises it
    let etl = PulseETL::new().progress(true).merge_env();

    let sink_kind = std::env::var(ENV_SINK).unwrap_or_else(|_| "sqlite".to_string());
    let out = std::env::var(ENV_OUT).ok().filter(|s| !s.trim().is_empty());

    let report = match sink_kind.trim().to_lowercase().as_str() {
        "sqlite" | "" => {
            let mut sink = SqliteTableSink::new(out.as_deref().unwrap_or(DEFAULT_SQLITE_OUT));
            etl.run(&mut sink)
        }
        "ndjson" => {
            let mut sink = NdjsonTableSink::new(out.as_deref().unwrap_or(DEFAULT_NDJSON_OUT))?;
            etl.run(&mut sink)
        }
        other => bail!("{ENV_SINK} must be `sqlite` or `ndjson`, got `{other}`"),
    };

    summarize(&report);
    let failed = report.failed_tables();
    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|t| t.table).collect();
        bail!("{} table(s) failed to load: {}", failed.len(), names.join(", "));
    }
    Ok(())
}

fn summarize(report: &RunReport) {
    for t in &report.tables {
        match &t.error {
            None => println!("{:<26} {:>9} rows  ({})", t.table, t.rows, t.mode),
            Some(e) => println!("{:<26} FAILED: {e}", t.table),
        }
    }
    println!("{} rows loaded, {} diagnostics", report.total_rows(), report.diagnostics.len());
}
