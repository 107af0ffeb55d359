use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Calendar quarter, always 1..=4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter(u8);

impl Quarter {
    pub fn new(q: u8) -> Option<Self> {
        (1..=4).contains(&q).then_some(Self(q))
    }
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

impl FromStr for Quarter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let q: u8 = s.trim().parse().map_err(|_| format!("invalid quarter `{s}`"))?;
        Quarter::new(q).ok_or_else(|| format!("quarter must be 1..=4, got {q}"))
    }
}

/// Where a snapshot sits in the tree: `<root>/<state>/<year>/<quarter>.json`.
/// Every extracted row is stamped with the coordinate of its file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotCoordinate {
    pub state: String,
    pub year: u16,
    pub quarter: Quarter,
}

impl SnapshotCoordinate {
    pub fn new(state: impl Into<String>, year: u16, quarter: Quarter) -> Self {
        Self { state: state.into(), year, quarter }
    }
}

impl fmt::Display for SnapshotCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:04}-{}", self.state, self.year, self.quarter)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum YearError {
    #[error("year directory is not numeric")]
    NotNumeric,
    #[error("year directory `{0}` is out of range (max 65535)")]
    OutOfRange(String),
}

/// Parse a year directory name. Only bare digits are accepted ("2021", not "2021a" or "+2021").
pub fn parse_year(name: &str) -> Result<u16, YearError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(YearError::NotNumeric);
    }
    name.parse().map_err(|_| YearError::OutOfRange(name.to_string()))
}
