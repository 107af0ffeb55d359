//! Flat row records and the column type hints handed to sinks.

use crate::coordinate::SnapshotCoordinate;
use crate::dataset::Dataset;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A single cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            Scalar::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Integer(i) => Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Scalar::Null => Value::Null,
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Text(v) => s.serialize_str(v),
            Scalar::Integer(v) => s.serialize_i64(*v),
            Scalar::Float(v) => s.serialize_f64(*v),
            Scalar::Null => s.serialize_none(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::Text(s.to_string()) }
}
impl From<String> for Scalar {
    fn from(s: String) -> Self { Scalar::Text(s) }
}
impl From<i64> for Scalar {
    fn from(v: i64) -> Self { Scalar::Integer(v) }
}
impl From<f64> for Scalar {
    fn from(v: f64) -> Self { Scalar::Float(v) }
}
impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Scalar::Null) }
}

/// One normalized record. Measures follow `dataset.measure_columns()` in order;
/// the coordinate columns are derived from `coordinate`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedRow {
    pub dataset: Dataset,
    pub coordinate: SnapshotCoordinate,
    measures: Vec<Scalar>,
}

impl ExtractedRow {
    /// Panics in debug builds if `measures` does not match the dataset's layout.
    pub fn new(dataset: Dataset, coordinate: &SnapshotCoordinate, measures: Vec<Scalar>) -> Self {
        debug_assert_eq!(measures.len(), dataset.measure_columns().len(), "{dataset} row layout");
        Self { dataset, coordinate: coordinate.clone(), measures }
    }

    /// Full row in column order.
    pub fn values(&self) -> Vec<Scalar> {
        let mut v = Vec::with_capacity(3 + self.measures.len());
        v.push(Scalar::Text(self.coordinate.state.clone()));
        v.push(Scalar::Integer(i64::from(self.coordinate.year)));
        v.push(Scalar::Integer(i64::from(self.coordinate.quarter.get())));
        v.extend(self.measures.iter().cloned());
        v
    }

    pub fn get(&self, column: &str) -> Option<Scalar> {
        let idx = self.dataset.columns().iter().position(|c| *c == column)?;
        self.values().into_iter().nth(idx)
    }

    pub fn to_json_object(&self) -> Map<String, Value> {
        self.dataset
            .columns()
            .into_iter()
            .zip(self.values())
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "VARCHAR(255)",
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "FLOAT",
        }
    }

    /// Widen `current` with one more observed value.
    fn observe(current: Option<ColumnType>, v: &Scalar) -> Option<ColumnType> {
        let seen = match v {
            Scalar::Null => return current,
            Scalar::Text(_) => ColumnType::Text,
            Scalar::Integer(_) => ColumnType::Integer,
            Scalar::Float(_) => ColumnType::Float,
        };
        Some(match (current, seen) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(ColumnType::Integer), ColumnType::Float) | (Some(ColumnType::Float), ColumnType::Integer) => ColumnType::Float,
            _ => ColumnType::Text,
        })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// Ordered column → type mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnTypeHints(Vec<(String, ColumnType)>);

impl ColumnTypeHints {
    /// Infer each column from its non-null values; columns with nothing to go on fall back to text.
    pub fn infer(columns: &[&str], rows: &[ExtractedRow]) -> Self {
        let mut seen: Vec<Option<ColumnType>> = vec![None; columns.len()];
        for row in rows {
            for (slot, v) in seen.iter_mut().zip(row.values().iter()) {
                *slot = ColumnType::observe(*slot, v);
            }
        }
        Self(
            columns
                .iter()
                .zip(seen)
                .map(|(c, t)| (c.to_string(), t.unwrap_or(ColumnType::Text)))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<ColumnType> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.0.iter().map(|(c, t)| (c.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
