//! Ranked entity lists: pincodes and districts.

use super::{count_amount, Emitter};
use crate::diagnostics::DiagnosticKind;
use crate::json_utils::{count_field, list_at, object_at, pincode_field, str_field, FieldError, ShapeError};
use crate::row::Scalar;
use serde_json::{Map, Value};

/// How an entity's name lands in the row.
#[derive(Clone, Copy, Debug)]
enum Entity {
    Pincode,
    District,
}

impl Entity {
    fn read(self, obj: &Map<String, Value>, field: &str) -> Result<Scalar, FieldError> {
        match self {
            Entity::Pincode => pincode_field(obj, field).map(Scalar::from),
            Entity::District => str_field(obj, field).map(Scalar::from),
        }
    }
}

/// `{<name_field>, metric {count, amount}}` entries.
fn metric_entries(list_name: &str, entries: &[Value], entity: Entity, out: &mut Emitter<'_>) {
    for (i, v) in entries.iter().enumerate() {
        let ctx = format!("{list_name}[{i}]");
        let Some(entry) = out.entry(v, &ctx) else { continue };
        let name = match entity.read(entry, "entityName") {
            Ok(name) => name,
            Err(e) => {
                out.field(&ctx, e);
                continue;
            }
        };
        let metric = match object_at(v, &["metric"]) {
            Ok(m) => m,
            Err(ShapeError::Missing { .. }) => {
                out.field(&ctx, FieldError::Missing { field: "metric".to_string() });
                continue;
            }
            Err(e) => {
                out.shape(&ctx, e);
                continue;
            }
        };
        if let Some((count, amount)) = count_amount(metric, &ctx, out) {
            out.row(vec![name, count.into(), amount.into()]);
        }
    }
}

/// `{name, registeredUsers}` entries.
fn user_entries(list_name: &str, entries: &[Value], entity: Entity, out: &mut Emitter<'_>) {
    for (i, v) in entries.iter().enumerate() {
        let ctx = format!("{list_name}[{i}]");
        let Some(entry) = out.entry(v, &ctx) else { continue };
        let parsed = entity
            .read(entry, "name")
            .and_then(|name| Ok((name, count_field(entry, "registeredUsers")?)));
        match parsed {
            Ok((name, users)) => out.row(vec![name, users.into()]),
            Err(e) => out.field(&ctx, e),
        }
    }
}

pub(super) fn pincode_metrics(snapshot: &Value, out: &mut Emitter<'_>) {
    match list_at(snapshot, &["data", "pincodes"]) {
        Ok(entries) => metric_entries("pincodes", entries, Entity::Pincode, out),
        Err(e) => out.shape("", e),
    }
}

/// The district list sits under whichever of `keys` first holds a list. A key present
/// with another type is reported and the search moves on.
pub(super) fn district_metrics(snapshot: &Value, keys: &[String], out: &mut Emitter<'_>) {
    for key in keys {
        match list_at(snapshot, &["data", key.as_str()]) {
            Ok(entries) => return metric_entries(key, entries, Entity::District, out),
            Err(ShapeError::Missing { .. }) => continue,
            Err(e) => out.shape("", e),
        }
    }
    out.issue(
        DiagnosticKind::MissingContainer,
        format!("no district list under any of data.{{{}}}", keys.join(",")),
    );
}

pub(super) fn pincode_users(snapshot: &Value, out: &mut Emitter<'_>) {
    match list_at(snapshot, &["data", "pincodes"]) {
        Ok(entries) => user_entries("pincodes", entries, Entity::Pincode, out),
        Err(e) => out.shape("", e),
    }
}

pub(super) fn district_users(snapshot: &Value, out: &mut Emitter<'_>) {
    match list_at(snapshot, &["data", "districts"]) {
        Ok(entries) => user_entries("districts", entries, Entity::District, out),
        Err(e) => out.shape("", e),
    }
}
