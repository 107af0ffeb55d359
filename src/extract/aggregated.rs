//! State-level totals: `data.transactionData` (transaction, insurance) and
//! `data.usersByDevice` (user).

use super::{total_metric, Emitter};
use crate::diagnostics::DiagnosticKind;
use crate::json_utils::{amount_field, count_field, list_at, object_at, opt_count_field, str_field, ShapeError};
use crate::row::Scalar;
use serde_json::Value;

const INSURANCE: &str = "Insurance";

/// One row per transaction type that has a complete TOTAL instrument.
pub(super) fn transaction(snapshot: &Value, out: &mut Emitter<'_>) {
    let entries = match list_at(snapshot, &["data", "transactionData"]) {
        Ok(entries) => entries,
        Err(e) => return out.shape("", e),
    };
    for (i, v) in entries.iter().enumerate() {
        let ctx = format!("transactionData[{i}]");
        let Some(entry) = out.entry(v, &ctx) else { continue };
        let name = match str_field(entry, "name") {
            Ok(name) => name,
            Err(e) => {
                out.field(&ctx, e);
                continue;
            }
        };
        let ctx = format!("transaction type `{name}`");
        if let Some((count, amount)) = total_metric(v, "paymentInstruments", &ctx, out) {
            out.row(vec![name.into(), count.into(), amount.into()]);
        }
    }
}

/// One row per device brand, each carrying the state's total registered users.
pub(super) fn user(snapshot: &Value, out: &mut Emitter<'_>) {
    let total = match object_at(snapshot, &["data", "aggregated"]) {
        Ok(agg) => match opt_count_field(agg, "registeredUsers") {
            Ok(None) => {
                out.issue(DiagnosticKind::MissingField, "data.aggregated.registeredUsers missing; rows carry null total");
                None
            }
            Ok(total) => total,
            Err(e) => {
                out.issue(DiagnosticKind::Conversion, format!("data.aggregated: {e}; rows carry null total"));
                None
            }
        },
        Err(e) => {
            out.shape("", e);
            None
        }
    };

    let brands = match list_at(snapshot, &["data", "usersByDevice"]) {
        Ok(brands) => brands,
        Err(e) => return out.shape("", e),
    };
    for (i, v) in brands.iter().enumerate() {
        let ctx = format!("usersByDevice[{i}]");
        let Some(entry) = out.entry(v, &ctx) else { continue };
        let parsed = str_field(entry, "brand").and_then(|brand| {
            let count = count_field(entry, "count")?;
            let pct = amount_field(entry, "percentage")?;
            Ok((brand, count, pct))
        });
        match parsed {
            Ok((brand, count, pct)) => out.row(vec![brand.into(), count.into(), pct.into(), Scalar::from(total)]),
            Err(e) => out.field(&ctx, e),
        }
    }
}

/// At most one row: the TOTAL of the first entry named `Insurance`.
pub(super) fn insurance(snapshot: &Value, out: &mut Emitter<'_>) {
    let entries = match list_at(snapshot, &["data", "transactionData"]) {
        Ok(entries) => entries,
        Err(e) => return out.shape("", e),
    };
    let found = entries
        .iter()
        .find(|v| v.get("name").and_then(Value::as_str) == Some(INSURANCE));
    let Some(entry) = found else {
        return out.shape("", ShapeError::Missing { path: format!("data.transactionData[name={INSURANCE}]") });
    };
    if let Some((count, amount)) = total_metric(entry, "paymentInstruments", INSURANCE, out) {
        out.row(vec![INSURANCE.into(), count.into(), amount.into()]);
    }
}
