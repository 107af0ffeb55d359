#![allow(dead_code)]

use pulse_etl::{Dataset, Quarter, SnapshotCoordinate};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fresh temp directory acting as the data root. Keep the `TempDir` alive for the test.
pub fn new_data_root() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn coord(state: &str, year: u16, q: u8) -> SnapshotCoordinate {
    SnapshotCoordinate::new(state, year, Quarter::new(q).unwrap())
}

/// `<data_root>/<dataset root>/<state>/<year>/<quarter>.json`
pub fn snapshot_path(data_root: &Path, dataset: Dataset, state: &str, year: &str, quarter_file: &str) -> PathBuf {
    dataset.default_root(data_root).join(state).join(year).join(quarter_file)
}

/// Write `body` as the snapshot for (state, year, quarter) of `dataset`'s tree.
pub fn write_snapshot(data_root: &Path, dataset: Dataset, state: &str, year: u16, quarter: u8, body: &Value) -> PathBuf {
    let path = snapshot_path(data_root, dataset, state, &year.to_string(), &format!("{quarter}.json"));
    write_raw(&path, &serde_json::to_string_pretty(body).unwrap());
    path
}

/// Write arbitrary bytes (e.g. malformed JSON) at `path`, creating parents.
pub fn write_raw(path: &Path, body: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
    path.to_path_buf()
}

/// Read a text file line-by-line (useful for .ndjson).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    BufReader::new(f).lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

pub fn read_ndjson(path: &Path) -> Vec<Value> {
    read_lines(path).into_iter().map(|l| serde_json::from_str(&l).unwrap()).collect()
}

// -------- snapshot payloads, shaped like the published pulse tree --------

pub fn agg_transaction(entries: &[(&str, i64, f64)]) -> Value {
    let list: Vec<Value> = entries
        .iter()
        .map(|(name, count, amount)| {
            json!({
                "name": name,
                "paymentInstruments": [{ "type": "TOTAL", "count": count, "amount": amount }]
            })
        })
        .collect();
    json!({ "success": true, "code": "SUCCESS", "data": { "from": 0, "to": 0, "transactionData": list } })
}

pub fn agg_user(total: i64, brands: &[(&str, i64, f64)]) -> Value {
    let list: Vec<Value> = brands
        .iter()
        .map(|(brand, count, pct)| json!({ "brand": brand, "count": count, "percentage": pct }))
        .collect();
    json!({ "data": { "aggregated": { "registeredUsers": total, "appOpens": 0 }, "usersByDevice": list } })
}

pub fn map_hover(districts: &[(&str, i64, f64)]) -> Value {
    let list: Vec<Value> = districts
        .iter()
        .map(|(name, count, amount)| json!({ "name": name, "metric": [{ "type": "TOTAL", "count": count, "amount": amount }] }))
        .collect();
    json!({ "data": { "hoverDataList": list } })
}

pub fn map_user(districts: &[(&str, i64, i64)]) -> Value {
    let mut hover = serde_json::Map::new();
    for (name, users, opens) in districts {
        hover.insert(name.to_string(), json!({ "registeredUsers": users, "appOpens": opens }));
    }
    json!({ "data": { "hoverData": hover } })
}

/// A top/transaction (or top/insurance) payload carrying both the pincode and district lists.
pub fn top_metrics(pincodes: &[(&str, i64, f64)], districts: &[(&str, i64, f64)]) -> Value {
    let entity = |(name, count, amount): &(&str, i64, f64)| {
        json!({ "entityName": name, "metric": { "type": "TOTAL", "count": count, "amount": amount } })
    };
    json!({
        "data": {
            "states": null,
            "districts": districts.iter().map(entity).collect::<Vec<_>>(),
            "pincodes": pincodes.iter().map(entity).collect::<Vec<_>>()
        }
    })
}

pub fn top_users(pincodes: &[(&str, i64)], districts: &[(&str, i64)]) -> Value {
    let p: Vec<Value> = pincodes.iter().map(|(n, u)| json!({ "name": n, "registeredUsers": u })).collect();
    let d: Vec<Value> = districts.iter().map(|(n, u)| json!({ "name": n, "registeredUsers": u })).collect();
    json!({ "data": { "states": null, "districts": d, "pincodes": p } })
}

/// Build a tiny, valid tree with one snapshot in every category root:
/// - aggregated/transaction: goa 2021 Q1 (2 types), karnataka 2022 Q3 (1 type)
/// - aggregated/user: goa 2021 Q1 (2 brands)
/// - aggregated/insurance: goa 2021 Q1 (Insurance entry)
/// - map/transaction + map/insurance: goa 2021 Q1 (2 districts each)
/// - map/user: goa 2021 Q1 (2 districts)
/// - top/transaction + top/insurance: goa 2021 Q1 (2 pincodes, 1 district)
/// - top/user: goa 2021 Q1 (1 pincode, 2 districts)
pub fn make_pulse_tree_basic(root: &Path) {
    write_snapshot(root, Dataset::AggregatedTransaction, "goa", 2021, 1,
        &agg_transaction(&[("Recharge & bill payments", 1200, 345000.5), ("Peer-to-peer payments", 800, 910000.0)]));
    write_snapshot(root, Dataset::AggregatedTransaction, "karnataka", 2022, 3,
        &agg_transaction(&[("Merchant payments", 42, 1999.0)]));
    write_snapshot(root, Dataset::AggregatedUser, "goa", 2021, 1,
        &agg_user(5000, &[("Xiaomi", 2000, 0.4), ("Samsung", 1500, 0.3)]));
    write_snapshot(root, Dataset::AggregatedInsurance, "goa", 2021, 1, &agg_transaction(&[("Insurance", 17, 8800.0)]));
    write_snapshot(root, Dataset::MapTransaction, "goa", 2021, 1,
        &map_hover(&[("north goa district", 600, 170000.0), ("south goa district", 400, 120000.0)]));
    write_snapshot(root, Dataset::MapInsurance, "goa", 2021, 1,
        &map_hover(&[("north goa district", 9, 4000.0), ("south goa district", 8, 4800.0)]));
    write_snapshot(root, Dataset::MapUser, "goa", 2021, 1,
        &map_user(&[("north goa district", 3000, 120), ("south goa district", 2000, 80)]));
    write_snapshot(root, Dataset::TopTransactionPincode, "goa", 2021, 1,
        &top_metrics(&[("403001", 300, 90000.0), ("403601", 200, 50000.0)], &[("north goa", 600, 170000.0)]));
    write_snapshot(root, Dataset::TopInsurancePincode, "goa", 2021, 1,
        &top_metrics(&[("403001", 5, 2500.0), ("403601", 4, 1900.0)], &[("north goa", 9, 4000.0)]));
    write_snapshot(root, Dataset::TopUserPincode, "goa", 2021, 1,
        &top_users(&[("403001", 1500)], &[("north goa", 3000), ("south goa", 2000)]));
}
