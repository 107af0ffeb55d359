//! Shape extractors: pure functions from a parsed snapshot plus its coordinate to
//! normalized rows. Nothing here touches the filesystem; problems found along the way
//! come back as `Issue`s for the caller to report against the file.

mod aggregated;
mod map;
mod top;

use crate::coordinate::SnapshotCoordinate;
use crate::dataset::Dataset;
use crate::diagnostics::DiagnosticKind;
use crate::json_utils::{amount_field, count_field, find_total, list_at, FieldError, JsonKind, RawSnapshot, ShapeError};
use crate::row::{ExtractedRow, Scalar};
use serde_json::{Map, Value};

/// Keys tried, in order, for the ranked district list of top/transaction snapshots.
pub const DEFAULT_TOP_DISTRICT_KEYS: [&str; 3] = ["states", "districts", "entities"];

#[derive(Clone, Debug, PartialEq)]
pub struct Issue {
    pub kind: DiagnosticKind,
    pub detail: String,
}

/// Rows and issues produced from one snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub rows: Vec<ExtractedRow>,
    pub issues: Vec<Issue>,
}

/// One extractor per dataset. Top/transaction district lookup carries its key order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeExtractor {
    AggregatedTransaction,
    AggregatedUser,
    AggregatedInsurance,
    MapTransaction,
    MapUser,
    MapInsurance,
    TopTransactionPincode,
    TopTransactionDistrict { keys: Vec<String> },
    TopUserPincode,
    TopUserDistrict,
    TopInsurancePincode,
}

impl ShapeExtractor {
    pub fn for_dataset(dataset: Dataset, top_district_keys: &[String]) -> Self {
        match dataset {
            Dataset::AggregatedTransaction => Self::AggregatedTransaction,
            Dataset::AggregatedUser => Self::AggregatedUser,
            Dataset::AggregatedInsurance => Self::AggregatedInsurance,
            Dataset::MapTransaction => Self::MapTransaction,
            Dataset::MapUser => Self::MapUser,
            Dataset::MapInsurance => Self::MapInsurance,
            Dataset::TopTransactionPincode => Self::TopTransactionPincode,
            Dataset::TopTransactionDistrict => Self::TopTransactionDistrict { keys: top_district_keys.to_vec() },
            Dataset::TopUserPincode => Self::TopUserPincode,
            Dataset::TopUserDistrict => Self::TopUserDistrict,
            Dataset::TopInsurancePincode => Self::TopInsurancePincode,
        }
    }

    /// Extractor with the default district key order.
    pub fn default_for(dataset: Dataset) -> Self {
        let keys: Vec<String> = DEFAULT_TOP_DISTRICT_KEYS.iter().map(|k| k.to_string()).collect();
        Self::for_dataset(dataset, &keys)
    }

    pub fn dataset(&self) -> Dataset {
        match self {
            Self::AggregatedTransaction => Dataset::AggregatedTransaction,
            Self::AggregatedUser => Dataset::AggregatedUser,
            Self::AggregatedInsurance => Dataset::AggregatedInsurance,
            Self::MapTransaction => Dataset::MapTransaction,
            Self::MapUser => Dataset::MapUser,
            Self::MapInsurance => Dataset::MapInsurance,
            Self::TopTransactionPincode => Dataset::TopTransactionPincode,
            Self::TopTransactionDistrict { .. } => Dataset::TopTransactionDistrict,
            Self::TopUserPincode => Dataset::TopUserPincode,
            Self::TopUserDistrict => Dataset::TopUserDistrict,
            Self::TopInsurancePincode => Dataset::TopInsurancePincode,
        }
    }

    /// Never fails: an unusable snapshot yields no rows and at least one issue.
    pub fn extract(&self, snapshot: &RawSnapshot, coordinate: &SnapshotCoordinate) -> Extraction {
        let mut out = Emitter::new(self.dataset(), coordinate);
        match self {
            Self::AggregatedTransaction => aggregated::transaction(snapshot, &mut out),
            Self::AggregatedUser => aggregated::user(snapshot, &mut out),
            Self::AggregatedInsurance => aggregated::insurance(snapshot, &mut out),
            Self::MapTransaction | Self::MapInsurance => map::hover_totals(snapshot, &mut out),
            Self::MapUser => map::user(snapshot, &mut out),
            Self::TopTransactionPincode | Self::TopInsurancePincode => top::pincode_metrics(snapshot, &mut out),
            Self::TopTransactionDistrict { keys } => top::district_metrics(snapshot, keys, &mut out),
            Self::TopUserPincode => top::pincode_users(snapshot, &mut out),
            Self::TopUserDistrict => top::district_users(snapshot, &mut out),
        }
        out.finish()
    }
}

/// Collects rows stamped with one coordinate, plus the issues met while producing them.
pub(crate) struct Emitter<'c> {
    dataset: Dataset,
    coordinate: &'c SnapshotCoordinate,
    out: Extraction,
}

impl<'c> Emitter<'c> {
    fn new(dataset: Dataset, coordinate: &'c SnapshotCoordinate) -> Self {
        Self { dataset, coordinate, out: Extraction::default() }
    }

    fn finish(self) -> Extraction {
        self.out
    }

    pub(crate) fn row(&mut self, measures: Vec<Scalar>) {
        self.out.rows.push(ExtractedRow::new(self.dataset, self.coordinate, measures));
    }

    pub(crate) fn issue(&mut self, kind: DiagnosticKind, detail: impl Into<String>) {
        self.out.issues.push(Issue { kind, detail: detail.into() });
    }

    /// Container-level problem. `ctx` names the entry it was found in, if any.
    pub(crate) fn shape(&mut self, ctx: &str, err: ShapeError) {
        let kind = match err {
            ShapeError::Missing { .. } => DiagnosticKind::MissingContainer,
            ShapeError::Mismatch { .. } => DiagnosticKind::ShapeMismatch,
        };
        self.issue(kind, with_ctx(ctx, &err));
    }

    /// Entry-level problem; the entry is dropped.
    pub(crate) fn field(&mut self, ctx: &str, err: FieldError) {
        let kind = match err {
            FieldError::Missing { .. } => DiagnosticKind::MissingField,
            FieldError::Invalid { .. } => DiagnosticKind::Conversion,
        };
        self.issue(kind, format!("{}; entry dropped", with_ctx(ctx, &err)));
    }

    /// `v` as an object, or a shape-mismatch issue.
    pub(crate) fn entry<'v>(&mut self, v: &'v Value, ctx: &str) -> Option<&'v Map<String, Value>> {
        match v.as_object() {
            Some(obj) => Some(obj),
            None => {
                self.issue(
                    DiagnosticKind::ShapeMismatch,
                    format!("{ctx}: expected object, found {}; entry skipped", JsonKind::of(v)),
                );
                None
            }
        }
    }
}

fn with_ctx(ctx: &str, err: &dyn std::fmt::Display) -> String {
    if ctx.is_empty() {
        err.to_string()
    } else {
        format!("{ctx}: {err}")
    }
}

/// `(count, amount)` from an object carrying both.
pub(crate) fn count_amount(obj: &Map<String, Value>, ctx: &str, out: &mut Emitter<'_>) -> Option<(i64, f64)> {
    let count = count_field(obj, "count");
    let amount = amount_field(obj, "amount");
    match (count, amount) {
        (Ok(c), Ok(a)) => Some((c, a)),
        (Err(e), _) | (_, Err(e)) => {
            out.field(ctx, e);
            None
        }
    }
}

/// `(count, amount)` of the TOTAL entry in `entry[list_key]`.
pub(crate) fn total_metric(entry: &Value, list_key: &str, ctx: &str, out: &mut Emitter<'_>) -> Option<(i64, f64)> {
    let items = match list_at(entry, &[list_key]) {
        Ok(items) => items,
        Err(e) => {
            out.shape(ctx, e);
            return None;
        }
    };
    match find_total(items) {
        Some(total) => count_amount(total, ctx, out),
        None => {
            out.issue(DiagnosticKind::MissingField, format!("{ctx}: no TOTAL entry in `{list_key}`; entry dropped"));
            None
        }
    }
}
