//! Shape-checked access into parsed snapshots.
//!
//! Lookups distinguish a container that is absent (or `null`) from one that is present
//! with the wrong JSON type, so extractors can tolerate the former and report the latter.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub type RawSnapshot = Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "list",
            JsonKind::Object => "object",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ShapeError {
    #[error("`{path}` not found")]
    Missing { path: String },
    #[error("`{path}` expected {expected}, found {found}")]
    Mismatch { path: String, expected: JsonKind, found: JsonKind },
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum FieldError {
    #[error("field `{field}` missing")]
    Missing { field: String },
    #[error("field `{field}` invalid: {detail}")]
    Invalid { field: String, detail: String },
}

fn dotted(path: &[&str]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.join(".")
}

/// Follow `path` through nested objects. A missing key or a `null` anywhere on the way
/// is `Missing`; a non-object intermediate is `Mismatch`.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, ShapeError> {
    let mut cur = root;
    for (i, key) in path.iter().enumerate() {
        cur = match cur {
            Value::Object(map) => match map.get(*key) {
                Some(Value::Null) | None => return Err(ShapeError::Missing { path: dotted(&path[..=i]) }),
                Some(v) => v,
            },
            Value::Null => return Err(ShapeError::Missing { path: dotted(&path[..i]) }),
            other => {
                return Err(ShapeError::Mismatch {
                    path: dotted(&path[..i]),
                    expected: JsonKind::Object,
                    found: JsonKind::of(other),
                })
            }
        };
    }
    if cur.is_null() {
        return Err(ShapeError::Missing { path: dotted(path) });
    }
    Ok(cur)
}

/// Safe optional-path accessor: `Some` only when every step exists and is non-null.
pub fn get_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    lookup(root, path).ok()
}

pub fn list_at<'a>(root: &'a Value, path: &[&str]) -> Result<&'a [Value], ShapeError> {
    match lookup(root, path)? {
        Value::Array(items) => Ok(items),
        other => Err(ShapeError::Mismatch { path: dotted(path), expected: JsonKind::Array, found: JsonKind::of(other) }),
    }
}

pub fn object_at<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Map<String, Value>, ShapeError> {
    match lookup(root, path)? {
        Value::Object(map) => Ok(map),
        other => Err(ShapeError::Mismatch { path: dotted(path), expected: JsonKind::Object, found: JsonKind::of(other) }),
    }
}

fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, FieldError> {
    match obj.get(field) {
        Some(Value::Null) | None => Err(FieldError::Missing { field: field.to_string() }),
        Some(v) => Ok(v),
    }
}

fn invalid(field: &str, detail: impl Into<String>) -> FieldError {
    FieldError::Invalid { field: field.to_string(), detail: detail.into() }
}

/// Non-empty string field.
pub fn str_field<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str, FieldError> {
    match present(obj, field)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.as_str()),
        Value::String(_) => Err(FieldError::Missing { field: field.to_string() }),
        other => Err(invalid(field, format!("expected string, found {}", JsonKind::of(other)))),
    }
}

/// Integer measure. Floats are accepted only when they carry no fractional part.
pub fn count_field(obj: &Map<String, Value>, field: &str) -> Result<i64, FieldError> {
    integer_value(present(obj, field)?).map_err(|detail| invalid(field, detail))
}

/// Like `count_field`, but an absent or null field is `Ok(None)`.
pub fn opt_count_field(obj: &Map<String, Value>, field: &str) -> Result<Option<i64>, FieldError> {
    match obj.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(v) => integer_value(v).map(Some).map_err(|detail| invalid(field, detail)),
    }
}

/// Floating-point measure (integers widen).
pub fn amount_field(obj: &Map<String, Value>, field: &str) -> Result<f64, FieldError> {
    match present(obj, field)? {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(field, format!("{n} is not representable"))),
        other => Err(invalid(field, format!("expected number, found {}", JsonKind::of(other)))),
    }
}

/// Pincode carried either as a digit string or a JSON integer.
pub fn pincode_field(obj: &Map<String, Value>, field: &str) -> Result<i64, FieldError> {
    match present(obj, field)? {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(field, format!("cannot convert `{s}` to an integer pincode"))),
        v @ Value::Number(_) => integer_value(v).map_err(|detail| invalid(field, detail)),
        other => Err(invalid(field, format!("expected pincode, found {}", JsonKind::of(other)))),
    }
}

fn integer_value(v: &Value) -> Result<i64, String> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.as_u64().is_some() {
                return Err(format!("{n} overflows a 64-bit integer"));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(format!("{n} is not an integer")),
            }
        }
        other => Err(format!("expected integer, found {}", JsonKind::of(other))),
    }
}

/// The first object in `items` whose `type` is `TOTAL`.
pub fn find_total(items: &[Value]) -> Option<&Map<String, Value>> {
    items
        .iter()
        .filter_map(Value::as_object)
        .find(|o| o.get("type").and_then(Value::as_str) == Some("TOTAL"))
}
