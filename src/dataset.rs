//! The eleven output datasets: one per (category, granularity, entity) combination,
//! with their table names, default snapshot roots and column layouts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Data category of a snapshot tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Transaction,
    User,
    Insurance,
}

/// How finely a snapshot slices its state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Aggregated, // state totals
    Map,        // district hover detail
    Top,        // ranked pincodes / districts
}

/// How a finished batch lands in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadMode {
    Replace,
    Append,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadMode::Replace => "replace",
            LoadMode::Append => "append",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dataset {
    AggregatedTransaction,
    AggregatedUser,
    AggregatedInsurance,
    MapTransaction,
    MapUser,
    MapInsurance,
    TopTransactionPincode,
    TopTransactionDistrict,
    TopUserPincode,
    TopUserDistrict,
    TopInsurancePincode,
}

const COORD_PASCAL: [&str; 3] = ["State", "Year", "Quarter"];
const COORD_LOWER: [&str; 3] = ["state", "year", "quarter"];

impl Dataset {
    /// All datasets in load order.
    pub const ALL: [Dataset; 11] = [
        Dataset::AggregatedTransaction,
        Dataset::AggregatedUser,
        Dataset::AggregatedInsurance,
        Dataset::MapTransaction,
        Dataset::MapUser,
        Dataset::MapInsurance,
        Dataset::TopTransactionPincode,
        Dataset::TopTransactionDistrict,
        Dataset::TopUserPincode,
        Dataset::TopUserDistrict,
        Dataset::TopInsurancePincode,
    ];

    pub fn category(self) -> Category {
        use Dataset::*;
        match self {
            AggregatedTransaction | MapTransaction | TopTransactionPincode | TopTransactionDistrict => Category::Transaction,
            AggregatedUser | MapUser | TopUserPincode | TopUserDistrict => Category::User,
            AggregatedInsurance | MapInsurance | TopInsurancePincode => Category::Insurance,
        }
    }

    pub fn granularity(self) -> Granularity {
        use Dataset::*;
        match self {
            AggregatedTransaction | AggregatedUser | AggregatedInsurance => Granularity::Aggregated,
            MapTransaction | MapUser | MapInsurance => Granularity::Map,
            TopTransactionPincode | TopTransactionDistrict | TopUserPincode | TopUserDistrict
            | TopInsurancePincode => Granularity::Top,
        }
    }

    pub fn table_name(self) -> &'static str {
        use Dataset::*;
        match self {
            AggregatedTransaction => "aggregated_transaction",
            AggregatedUser => "aggregated_user",
            AggregatedInsurance => "aggregated_insurance",
            MapTransaction => "map_transactions",
            MapUser => "map_users",
            MapInsurance => "map_insurance",
            TopTransactionPincode => "top_transaction_pincode",
            TopTransactionDistrict => "top_transaction_district",
            TopUserPincode => "top_user_pincode",
            TopUserDistrict => "top_user_district",
            TopInsurancePincode => "top_insurance_pincode",
        }
    }

    /// Snapshot root relative to the data root. Pincode and district datasets of the
    /// same category share one tree.
    pub fn relative_root(self) -> &'static str {
        match (self.granularity(), self.category()) {
            (Granularity::Aggregated, Category::Transaction) => "aggregated/transaction/country/india/state",
            (Granularity::Aggregated, Category::User) => "aggregated/user/country/india/state",
            (Granularity::Aggregated, Category::Insurance) => "aggregated/insurance/country/india/state",
            (Granularity::Map, Category::Transaction) => "map/transaction/hover/country/india/state",
            (Granularity::Map, Category::User) => "map/user/hover/country/india/state",
            (Granularity::Map, Category::Insurance) => "map/insurance/hover/country/india/state",
            (Granularity::Top, Category::Transaction) => "top/transaction/country/india/state",
            (Granularity::Top, Category::User) => "top/user/country/india/state",
            (Granularity::Top, Category::Insurance) => "top/insurance/country/india/state",
        }
    }

    pub fn default_root(self, data_root: &Path) -> PathBuf {
        data_root.join(self.relative_root())
    }

    /// Aggregated insurance historically accumulates across loads; everything else is rebuilt.
    pub fn default_load_mode(self) -> LoadMode {
        match self {
            Dataset::AggregatedInsurance => LoadMode::Append,
            _ => LoadMode::Replace,
        }
    }

    pub fn coordinate_columns(self) -> [&'static str; 3] {
        match self {
            Dataset::AggregatedUser => COORD_LOWER,
            _ => COORD_PASCAL,
        }
    }

    /// Measure columns, in row order, following the coordinate columns.
    pub fn measure_columns(self) -> &'static [&'static str] {
        use Dataset::*;
        match self {
            AggregatedTransaction => &["TransactionType", "TransactionCount", "TransactionAmount"],
            AggregatedUser => &["brand", "count", "percentage", "registeredUsers"],
            AggregatedInsurance => &["InsuranceType", "InsuranceCount", "InsuranceAmount"],
            MapTransaction | TopTransactionDistrict => &["District", "TransactionCount", "TransactionAmount"],
            MapUser => &["District", "RegisteredUsers", "AppOpens"],
            MapInsurance => &["District", "InsuranceCount", "InsuranceAmount"],
            TopTransactionPincode => &["Pincode", "TransactionCount", "TransactionAmount"],
            TopUserPincode => &["Pincode", "RegisteredUsers"],
            TopUserDistrict => &["District", "RegisteredUsers"],
            TopInsurancePincode => &["Pincode", "InsuranceCount", "InsuranceAmount"],
        }
    }

    pub fn columns(self) -> Vec<&'static str> {
        let mut cols = self.coordinate_columns().to_vec();
        cols.extend_from_slice(self.measure_columns());
        cols
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Dataset {
    type Err = String;
    /// Accepts the table name (case-insensitive, `-` or `_` separated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace('-', "_");
        Dataset::ALL
            .iter()
            .copied()
            .find(|d| d.table_name() == norm)
            .ok_or_else(|| format!("unknown dataset `{s}`"))
    }
}
