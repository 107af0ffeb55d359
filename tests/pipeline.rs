#[path = "common/mod.rs"]
mod common;

use anyhow::{bail, Result};
use common::*;
use pulse_etl::{
    ColumnType, ColumnTypeHints, Dataset, DiagnosticKind, ExtractOptions, LoadMode, MemorySink, PulseETL, RowBatch,
    Scalar, TableSink,
};

fn expected_rows(ds: Dataset) -> usize {
    match ds {
        Dataset::AggregatedTransaction => 3,
        Dataset::AggregatedUser => 2,
        Dataset::AggregatedInsurance => 1,
        Dataset::MapTransaction | Dataset::MapInsurance | Dataset::MapUser => 2,
        Dataset::TopTransactionPincode => 2,
        Dataset::TopTransactionDistrict => 1,
        Dataset::TopUserPincode => 1,
        Dataset::TopUserDistrict => 2,
        Dataset::TopInsurancePincode => 2,
    }
}

/// Full run over the basic tree into the in-memory sink:
/// - every one of the eleven tables is written, in dataset order
/// - row counts match the fixture
/// - aggregated_insurance is appended, everything else replaced
/// - a clean tree produces no diagnostics
#[test]
fn run_basic_tree_into_memory() {
    let tmp = new_data_root();
    make_pulse_tree_basic(tmp.path());

    let mut sink = MemorySink::new();
    let report = PulseETL::new().data_root(tmp.path()).run(&mut sink);

    assert!(report.diagnostics.is_empty(), "{:#?}", report.diagnostics.all());
    assert!(report.failed_tables().is_empty());
    let order: Vec<Dataset> = report.tables.iter().map(|t| t.dataset).collect();
    assert_eq!(order, Dataset::ALL.to_vec());

    for ds in Dataset::ALL {
        let table = sink.table(ds.table_name()).unwrap();
        assert_eq!(table.rows.len(), expected_rows(ds), "{ds}");
        assert_eq!(table.columns, ds.columns());
        let want_mode = if ds == Dataset::AggregatedInsurance { LoadMode::Append } else { LoadMode::Replace };
        assert_eq!(table.last_mode, want_mode, "{ds}");
    }
    assert_eq!(report.total_rows(), 20);

    let agg = sink.table("aggregated_transaction").unwrap();
    assert_eq!(agg.hints.get("TransactionCount"), Some(ColumnType::Integer));
    assert_eq!(agg.hints.get("TransactionAmount"), Some(ColumnType::Float));
    assert_eq!(agg.hints.get("State"), Some(ColumnType::Text));
    assert_eq!(
        agg.column("State"),
        vec![Scalar::from("goa"), Scalar::from("goa"), Scalar::from("karnataka")]
    );

    let pins = sink.table("top_transaction_pincode").unwrap();
    assert_eq!(pins.hints.get("Pincode"), Some(ColumnType::Integer));
    assert_eq!(pins.column("Pincode"), vec![Scalar::Integer(403001), Scalar::Integer(403601)]);
}

/// A malformed file is reported as a parse diagnostic with its path and skipped;
/// sibling files in the same tree are still extracted.
#[test]
fn malformed_json_is_skipped_and_reported() {
    let tmp = new_data_root();
    let root = tmp.path();
    let ds = Dataset::AggregatedTransaction;
    write_snapshot(root, ds, "goa", 2021, 1, &agg_transaction(&[("Recharge", 1, 10.0)]));
    let bad = write_raw(&snapshot_path(root, ds, "goa", "2021", "2.json"), "{ \"data\": { \"transactionData\": [ ");
    write_snapshot(root, ds, "goa", 2021, 3, &agg_transaction(&[("Recharge", 3, 30.0)]));

    let run = PulseETL::new().data_root(root).extract_dataset(ds);

    let quarters: Vec<Scalar> = run.accumulator.rows(ds).iter().map(|r| r.get("Quarter").unwrap()).collect();
    assert_eq!(quarters, vec![Scalar::Integer(1), Scalar::Integer(3)]);
    assert_eq!(run.diagnostics.count(DiagnosticKind::Parse), 1);
    let d = &run.diagnostics.all()[0];
    assert_eq!(d.path.as_deref(), Some(bad.as_path()));
    assert_eq!(d.dataset, Some(ds));
}

/// Every row's coordinate matches the directory it came from, across states and years.
#[test]
fn rows_carry_their_path_coordinates() {
    let tmp = new_data_root();
    let root = tmp.path();
    let ds = Dataset::MapUser;
    write_snapshot(root, ds, "assam", 2018, 1, &map_user(&[("kamrup", 10, 1)]));
    write_snapshot(root, ds, "assam", 2019, 4, &map_user(&[("kamrup", 20, 2)]));
    write_snapshot(root, ds, "sikkim", 2020, 2, &map_user(&[("east sikkim", 30, 3)]));

    let run = PulseETL::new().data_root(root).extract_dataset(ds);
    let got: Vec<(String, u16, u8, Scalar)> = run
        .accumulator
        .rows(ds)
        .iter()
        .map(|r| (r.coordinate.state.clone(), r.coordinate.year, r.coordinate.quarter.get(), r.get("RegisteredUsers").unwrap()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("assam".to_string(), 2018, 1, Scalar::Integer(10)),
            ("assam".to_string(), 2019, 4, Scalar::Integer(20)),
            ("sikkim".to_string(), 2020, 2, Scalar::Integer(30)),
        ]
    );
}

/// Two extraction passes over the same tree produce identical batches, and two
/// replace-mode runs leave the same table behind (append tables accumulate).
#[test]
fn runs_are_idempotent_under_replace() {
    let tmp = new_data_root();
    make_pulse_tree_basic(tmp.path());
    let etl = PulseETL::new().data_root(tmp.path());

    let mut a = etl.extract();
    let mut b = etl.extract();
    for ds in Dataset::ALL {
        assert_eq!(a.accumulator.finalize(ds), b.accumulator.finalize(ds), "{ds}");
    }

    let mut sink = MemorySink::new();
    etl.run(&mut sink);
    let first = sink.table("aggregated_transaction").unwrap().rows.clone();
    etl.run(&mut sink);
    let t = sink.table("aggregated_transaction").unwrap();
    assert_eq!(t.rows, first);
    assert_eq!(t.writes, 2);
    assert_eq!(sink.table("aggregated_insurance").unwrap().rows.len(), 2);
}

/// A missing category root contributes an empty table (still written, so a replace
/// clears stale data) and a traversal diagnostic; other datasets are unaffected.
#[test]
fn missing_root_yields_empty_table() {
    let tmp = new_data_root();
    write_snapshot(tmp.path(), Dataset::MapUser, "goa", 2021, 1, &map_user(&[("north goa", 1, 1)]));

    let mut sink = MemorySink::new();
    let report = PulseETL::new()
        .data_root(tmp.path())
        .datasets([Dataset::MapTransaction, Dataset::MapUser])
        .run(&mut sink);

    assert_eq!(report.tables.len(), 2);
    assert_eq!(sink.table("map_transactions").unwrap().rows.len(), 0);
    assert_eq!(sink.table("map_users").unwrap().rows.len(), 1);
    assert_eq!(report.diagnostics.count(DiagnosticKind::Traversal), 1);
    assert_eq!(report.diagnostics.for_dataset(Dataset::MapTransaction).len(), 1);
    assert!(sink.table("aggregated_user").is_none());
}

/// Sink that refuses one table and records the rest.
struct FlakySink {
    refuse: &'static str,
    inner: MemorySink,
}

impl TableSink for FlakySink {
    fn write(&mut self, table: &str, batch: &RowBatch, mode: LoadMode, hints: &ColumnTypeHints) -> Result<()> {
        if table == self.refuse {
            bail!("connection reset while writing {table}");
        }
        self.inner.write(table, batch, mode, hints)
    }
}

/// A failing table is reported as a sink diagnostic and in the report; tables after
/// it are still written.
#[test]
fn failed_table_does_not_stop_later_tables() {
    let tmp = new_data_root();
    make_pulse_tree_basic(tmp.path());

    let mut sink = FlakySink { refuse: "aggregated_user", inner: MemorySink::new() };
    let report = PulseETL::new().data_root(tmp.path()).run(&mut sink);

    let failed = report.failed_tables();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].table, "aggregated_user");
    assert!(failed[0].error.as_ref().unwrap().contains("connection reset"));
    assert_eq!(report.diagnostics.count(DiagnosticKind::Sink), 1);

    assert!(sink.inner.table("aggregated_user").is_none());
    assert_eq!(sink.inner.table("aggregated_insurance").unwrap().rows.len(), 1);
    assert_eq!(sink.inner.table("top_insurance_pincode").unwrap().rows.len(), 2);
    assert_eq!(sink.inner.table_names().len(), 10);
}

/// Dataset-level parallelism produces the same tables as the sequential run.
#[test]
fn concurrent_extraction_matches_sequential() {
    let tmp = new_data_root();
    make_pulse_tree_basic(tmp.path());

    let mut seq = MemorySink::new();
    let mut par = MemorySink::new();
    PulseETL::new().data_root(tmp.path()).run(&mut seq);
    PulseETL::new().data_root(tmp.path()).dataset_concurrency(4).run(&mut par);

    for ds in Dataset::ALL {
        assert_eq!(seq.table(ds.table_name()), par.table(ds.table_name()), "{ds}");
    }
}

/// Options: per-dataset root and load-mode overrides, and environment-style overrides.
#[test]
fn option_overrides() {
    let tmp = new_data_root();
    let custom = tmp.path().join("elsewhere");
    write_snapshot(&custom, Dataset::TopUserDistrict, "goa", 2021, 1, &top_users(&[], &[("north goa", 5)]));
    let custom_root = Dataset::TopUserDistrict.default_root(&custom);

    let mut sink = MemorySink::new();
    let report = PulseETL::new()
        .data_root(tmp.path())
        .datasets([Dataset::TopUserDistrict])
        .dataset_root(Dataset::TopUserDistrict, &custom_root)
        .load_mode(Dataset::TopUserDistrict, LoadMode::Append)
        .run(&mut sink);
    assert_eq!(report.tables[0].rows, 1);
    assert_eq!(report.tables[0].mode, LoadMode::Append);

    let opts = ExtractOptions::default().merge_vars(|name| match name {
        "PULSE_ETL_DATA_ROOT" => Some("/srv/pulse/data".to_string()),
        "PULSE_ETL_DATASETS" => Some("map_users, top-user-district,bogus".to_string()),
        "PULSE_ETL_TOP_DISTRICT_KEYS" => Some("districts,states".to_string()),
        "PULSE_ETL_CONCURRENCY" => Some(" 3 ".to_string()),
        _ => None,
    });
    assert_eq!(opts.dataset_concurrency, 3);
    assert_eq!(opts.data_root, std::path::PathBuf::from("/srv/pulse/data"));
    assert_eq!(opts.datasets, vec![Dataset::MapUser, Dataset::TopUserDistrict]);
    assert_eq!(opts.top_district_keys, vec!["districts".to_string(), "states".to_string()]);
    assert_eq!(opts.load_mode_for(Dataset::AggregatedInsurance), LoadMode::Append);
    assert_eq!(opts.load_mode_for(Dataset::MapUser), LoadMode::Replace);

    // single-threaded by default; an unparseable value leaves it there
    assert_eq!(ExtractOptions::default().dataset_concurrency, 1);
    let opts = ExtractOptions::default().merge_vars(|name| (name == "PULSE_ETL_CONCURRENCY").then(|| "lots".to_string()));
    assert_eq!(opts.dataset_concurrency, 1);
}

/// Loading a single-dataset extraction writes only that table: tables from an earlier
/// full run stay as they were, including replace-mode ones.
#[test]
fn loading_one_dataset_leaves_other_tables_alone() {
    let tmp = new_data_root();
    make_pulse_tree_basic(tmp.path());
    let etl = PulseETL::new().data_root(tmp.path());

    let mut sink = MemorySink::new();
    etl.run(&mut sink);
    let before = sink.table("map_transactions").unwrap().clone();
    assert_eq!(before.rows.len(), 2);

    let run = etl.extract_dataset(Dataset::MapUser);
    assert_eq!(run.datasets, vec![Dataset::MapUser]);
    let report = etl.load(run, &mut sink);

    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].table, "map_users");
    assert_eq!(sink.table("map_users").unwrap().writes, 2);
    assert_eq!(sink.table("map_transactions").unwrap(), &before);
    for ds in Dataset::ALL.into_iter().filter(|&d| d != Dataset::MapUser) {
        assert_eq!(sink.table(ds.table_name()).unwrap().writes, 1, "{ds}");
    }
}
