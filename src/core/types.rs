use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::validation::natural_cmp;

/// Errors raised when a single scalar value cannot be interpreted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Invalid HGNC id: '{0}'")]
    InvalidHgncId(String),

    #[error("Invalid panel version: '{0}'")]
    InvalidVersion(String),

    #[error("Unknown confidence level: '{0}'")]
    InvalidConfidence(String),

    #[error("Unknown record status: '{0}'")]
    InvalidStatus(String),

    #[error("Unknown panel type: '{0}'")]
    InvalidSource(String),

    #[error("Invalid date: '{0}'")]
    InvalidDate(String),
}

/// Stable external identifier of a panel (the PanelApp id for registry panels)
///
/// Ordering is "natural": numeric ids compare by value, so `"9" < "10"`, and
/// numeric ids sort before free-text ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(pub String);

impl PanelId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id looks like a registry id (all digits)
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_digit())
    }
}

impl Ord for PanelId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for PanelId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HGNC gene identifier, always rendered as `HGNC:<n>`
///
/// This is the comparison key for genes everywhere; symbols are display-only
/// because they get renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HgncId(u32);

impl HgncId {
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    #[must_use]
    pub fn number(self) -> u32 {
        self.0
    }

    /// Cheap check used by the canonicalizer to tell ids from symbols
    pub fn looks_like_id(s: &str) -> bool {
        s.trim().parse::<Self>().is_ok()
    }
}

impl FromStr for HgncId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("hgnc:") => &trimmed[5..],
            _ => trimmed,
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValueError::InvalidHgncId(s.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| ValueError::InvalidHgncId(s.to_string()))
    }
}

impl TryFrom<String> for HgncId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HgncId> for String {
    fn from(id: HgncId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for HgncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HGNC:{}", self.0)
    }
}

/// Registry panel version (`major.minor`)
///
/// Versions compare numerically component by component, so `1.10 > 1.9`.
/// A bare major number parses as `major.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PanelVersion {
    pub major: u32,
    pub minor: u32,
}

impl PanelVersion {
    /// Version given to locally maintained panels that carry none
    pub const UNVERSIONED: PanelVersion = PanelVersion { major: 0, minor: 0 };

    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for PanelVersion {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidVersion(s.to_string());
        let trimmed = s.trim();
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for PanelVersion {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PanelVersion> for String {
    fn from(version: PanelVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for PanelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parse a sign-off date: `YYYY-MM-DD`, an ISO timestamp, or `DD/MM/YYYY`
///
/// # Errors
///
/// Returns `ValueError::InvalidDate` for anything else.
pub fn parse_date(s: &str) -> Result<chrono::NaiveDate, ValueError> {
    let trimmed = s.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| chrono::NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(|_| ValueError::InvalidDate(s.to_string()))
}

/// Gene confidence rating, ordered `Red < Amber < Green`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Red,
    Amber,
    Green,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Amber => "amber",
            Self::Green => "green",
        }
    }
}

impl FromStr for Confidence {
    type Err = ValueError;

    /// Accepts the textual ratings in any casing and the registry's numeric
    /// levels (`0`/`1` red, `2` amber, `3` green).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "low" | "0" | "1" => Ok(Self::Red),
            "amber" | "medium" | "2" => Ok(Self::Amber),
            "green" | "high" | "3" => Ok(Self::Green),
            _ => Err(ValueError::InvalidConfidence(s.to_string())),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soft-delete marker for panel and link rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Current,
    Retired,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Retired => "retired",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "current" | "active" => Ok(Self::Current),
            "retired" | "superseded" | "inactive" => Ok(Self::Retired),
            _ => Err(ValueError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a panel's gene content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelSource {
    /// Refreshed from the registry
    PanelApp,
    /// Maintained locally, never touched by the planner
    Local,
}

impl PanelSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PanelApp => "PanelApp",
            Self::Local => "Local",
        }
    }
}

impl FromStr for PanelSource {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "panelapp" | "1" => Ok(Self::PanelApp),
            "local" | "eastglh" | "2" => Ok(Self::Local),
            _ => Err(ValueError::InvalidSource(s.to_string())),
        }
    }
}

impl fmt::Display for PanelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hgnc_id_parsing() {
        assert_eq!("HGNC:1100".parse::<HgncId>().unwrap(), HgncId::new(1100));
        assert_eq!("hgnc:1100".parse::<HgncId>().unwrap(), HgncId::new(1100));
        assert_eq!(" 1100 ".parse::<HgncId>().unwrap(), HgncId::new(1100));
        assert!("BRCA1".parse::<HgncId>().is_err());
        assert!("HGNC:".parse::<HgncId>().is_err());
        assert!("HGNC:12a".parse::<HgncId>().is_err());
        assert_eq!(HgncId::new(9).to_string(), "HGNC:9");
    }

    #[test]
    fn test_hgnc_id_orders_numerically() {
        let mut ids: Vec<HgncId> = ["HGNC:10", "HGNC:9", "HGNC:100"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![HgncId::new(9), HgncId::new(10), HgncId::new(100)]);
    }

    #[test]
    fn test_panel_version_ordering() {
        let v1_9: PanelVersion = "1.9".parse().unwrap();
        let v1_10: PanelVersion = "1.10".parse().unwrap();
        let v2: PanelVersion = "2".parse().unwrap();
        assert!(v1_10 > v1_9);
        assert!(v2 > v1_10);
        assert_eq!(v2, PanelVersion::new(2, 0));
        assert_eq!(v2.to_string(), "2.0");
        assert!("two".parse::<PanelVersion>().is_err());
        assert!("1.2.3".parse::<PanelVersion>().is_err());
    }

    #[test]
    fn test_confidence_vocabulary() {
        assert_eq!("GREEN".parse::<Confidence>().unwrap(), Confidence::Green);
        assert_eq!("3".parse::<Confidence>().unwrap(), Confidence::Green);
        assert_eq!("2".parse::<Confidence>().unwrap(), Confidence::Amber);
        assert_eq!("0".parse::<Confidence>().unwrap(), Confidence::Red);
        assert_eq!("1".parse::<Confidence>().unwrap(), Confidence::Red);
        assert!("purple".parse::<Confidence>().is_err());
        assert!(Confidence::Red < Confidence::Amber);
        assert!(Confidence::Amber < Confidence::Green);
    }

    #[test]
    fn test_panel_id_natural_order() {
        let mut ids = vec![
            PanelId::new("R-custom"),
            PanelId::new("10"),
            PanelId::new("9"),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![PanelId::new("9"), PanelId::new("10"), PanelId::new("R-custom")]
        );
        assert!(PanelId::new("486").is_numeric());
        assert!(!PanelId::new("R134").is_numeric());
    }

    #[test]
    fn test_panel_source_parsing() {
        assert_eq!("PanelApp".parse::<PanelSource>().unwrap(), PanelSource::PanelApp);
        assert_eq!("East GLH".parse::<PanelSource>().unwrap(), PanelSource::Local);
        assert!("elsewhere".parse::<PanelSource>().is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_date("2024-05-01").unwrap(), expected);
        assert_eq!(parse_date("2024-05-01T10:22:01Z").unwrap(), expected);
        assert_eq!(parse_date("01/05/2024").unwrap(), expected);
        assert!(parse_date("May 2024").is_err());
    }
}
