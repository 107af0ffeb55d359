//! District-level hover detail.

use super::{total_metric, Emitter};
use crate::diagnostics::DiagnosticKind;
use crate::json_utils::{count_field, list_at, object_at, str_field, FieldError, JsonKind};
use crate::row::Scalar;
use serde_json::Value;

/// `data.hoverDataList[]`: one row per district with a TOTAL metric.
/// Shared by the transaction and insurance trees, whose layouts are identical.
pub(super) fn hover_totals(snapshot: &Value, out: &mut Emitter<'_>) {
    let entries = match list_at(snapshot, &["data", "hoverDataList"]) {
        Ok(entries) => entries,
        Err(e) => return out.shape("", e),
    };
    for (i, v) in entries.iter().enumerate() {
        let ctx = format!("hoverDataList[{i}]");
        let Some(entry) = out.entry(v, &ctx) else { continue };
        let district = match str_field(entry, "name") {
            Ok(name) => name,
            Err(e) => {
                out.field(&ctx, e);
                continue;
            }
        };
        let ctx = format!("district `{district}`");
        if let Some((count, amount)) = total_metric(v, "metric", &ctx, out) {
            out.row(vec![district.into(), count.into(), amount.into()]);
        }
    }
}

/// `data.hoverData` is keyed by district name. `registeredUsers` is required;
/// `appOpens` is optional and becomes null when absent or unusable.
pub(super) fn user(snapshot: &Value, out: &mut Emitter<'_>) {
    let districts = match object_at(snapshot, &["data", "hoverData"]) {
        Ok(map) => map,
        Err(e) => return out.shape("", e),
    };
    for (district, v) in districts {
        let ctx = format!("district `{district}`");
        if district.trim().is_empty() {
            out.field("hoverData", FieldError::Missing { field: "district name".to_string() });
            continue;
        }
        let Some(metrics) = v.as_object() else {
            out.issue(
                DiagnosticKind::ShapeMismatch,
                format!("{ctx}: expected object, found {}; entry skipped", JsonKind::of(v)),
            );
            continue;
        };
        let registered = match count_field(metrics, "registeredUsers") {
            Ok(n) => n,
            Err(e) => {
                out.field(&ctx, e);
                continue;
            }
        };
        let app_opens = match metrics.get("appOpens") {
            None | Some(Value::Null) => Scalar::Null,
            Some(_) => match count_field(metrics, "appOpens") {
                Ok(n) => Scalar::Integer(n),
                Err(e) => {
                    out.issue(DiagnosticKind::Conversion, format!("{ctx}: {e}; stored as null"));
                    Scalar::Null
                }
            },
        };
        out.row(vec![district.as_str().into(), registered.into(), app_opens]);
    }
}
