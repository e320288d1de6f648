//! Keyed, field-level comparison of two canonical datasets.
//!
//! The same engine serves every comparison in the pipeline; only the entity
//! type and the key function change:
//!
//! | Comparison | Entity | Key |
//! |------------|--------|-----|
//! | spreadsheet vs database panels | [`IndicationView`](tracked::IndicationView) | [`keys::indication`] |
//! | spreadsheet vs database genes | `PanelGeneLink` | [`keys::panel_gene`] |
//! | registry vs database panels | `Panel` | [`keys::panel`] |
//! | genepanels vs genepanels | `GenepanelsRow` | [`keys::genepanels_row`] |
//!
//! Each entity type lists its compared fields through [`Tracked`]. Values
//! compare in their typed form, so `"1.10"` and `"1.9"` are different
//! versions and confidence levels compare as enum values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::core::types::{Confidence, PanelVersion};

pub mod keys;
pub mod report;
pub mod tracked;

/// A typed field value as compared by the diff engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum FieldValue {
    Text(String),
    Confidence(Confidence),
    Version(PanelVersion),
    Date(NaiveDate),
    Empty,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// `Empty` for `None`, otherwise the mapped value
    pub fn optional<T>(value: Option<T>, f: impl FnOnce(T) -> FieldValue) -> Self {
        value.map_or(Self::Empty, f)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Confidence(c) => write!(f, "{c}"),
            Self::Version(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Empty => Ok(()),
        }
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        value.to_string()
    }
}

/// An entity with a fixed list of compared fields
///
/// Every value of one type must return the same field names in the same
/// order.
pub trait Tracked {
    fn fields(&self) -> Vec<(&'static str, FieldValue)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffCategory {
    /// Key present on the right only
    MissingLeft,
    /// Key present on the left only
    MissingRight,
    /// Key on both sides, one tracked field differs
    ValueMismatch,
}

impl DiffCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingLeft => "missing_left",
            Self::MissingRight => "missing_right",
            Self::ValueMismatch => "value_mismatch",
        }
    }
}

impl fmt::Display for DiffCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between the two sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord<K> {
    pub key: K,
    /// `None` for whole-key records
    pub field: Option<&'static str>,
    pub left_value: Option<FieldValue>,
    pub right_value: Option<FieldValue>,
    pub category: DiffCategory,
}

/// Record counts by category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub missing_left: usize,
    pub missing_right: usize,
    pub value_mismatch: usize,
    /// Entities ignored because an earlier one had the same key
    pub duplicate_keys: usize,
}

impl DiffSummary {
    pub fn from_records<K>(records: &[DiffRecord<K>]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.category {
                DiffCategory::MissingLeft => summary.missing_left += 1,
                DiffCategory::MissingRight => summary.missing_right += 1,
                DiffCategory::ValueMismatch => summary.value_mismatch += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.missing_left + self.missing_right + self.value_mismatch
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Records plus their summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison<K> {
    pub records: Vec<DiffRecord<K>>,
    pub summary: DiffSummary,
}

impl<K> Comparison<K> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Field-level differences between `left` and `right`, sorted by key then
/// field (whole-key records first)
pub fn diff<T, K, F>(left: &[T], right: &[T], key_fn: F) -> Vec<DiffRecord<K>>
where
    T: Tracked,
    K: Ord + Clone + fmt::Debug,
    F: Fn(&T) -> K,
{
    compare(left, right, key_fn).records
}

/// [`diff`] plus a [`DiffSummary`] that also counts duplicate keys
pub fn compare<T, K, F>(left: &[T], right: &[T], key_fn: F) -> Comparison<K>
where
    T: Tracked,
    K: Ord + Clone + fmt::Debug,
    F: Fn(&T) -> K,
{
    let (left_map, left_duplicates) = partition(left, &key_fn, "left");
    let (right_map, right_duplicates) = partition(right, &key_fn, "right");

    let mut records = Vec::new();
    for (key, left_item) in &left_map {
        let Some(right_item) = right_map.get(key) else {
            records.push(DiffRecord {
                key: key.clone(),
                field: None,
                left_value: None,
                right_value: None,
                category: DiffCategory::MissingRight,
            });
            continue;
        };

        for ((field, left_value), (_, right_value)) in
            left_item.fields().into_iter().zip(right_item.fields())
        {
            if left_value != right_value {
                records.push(DiffRecord {
                    key: key.clone(),
                    field: Some(field),
                    left_value: Some(left_value),
                    right_value: Some(right_value),
                    category: DiffCategory::ValueMismatch,
                });
            }
        }
    }
    for key in right_map.keys().filter(|k| !left_map.contains_key(*k)) {
        records.push(DiffRecord {
            key: key.clone(),
            field: None,
            left_value: None,
            right_value: None,
            category: DiffCategory::MissingLeft,
        });
    }

    records.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.field.cmp(&b.field)));

    let mut summary = DiffSummary::from_records(&records);
    summary.duplicate_keys = left_duplicates + right_duplicates;
    Comparison { records, summary }
}

/// Index items by key; the first item with a key wins
fn partition<'a, T, K, F>(items: &'a [T], key_fn: &F, side: &str) -> (BTreeMap<K, &'a T>, usize)
where
    K: Ord + fmt::Debug,
    F: Fn(&T) -> K,
{
    let mut map = BTreeMap::new();
    let mut duplicates = 0;
    for item in items {
        let key = key_fn(item);
        if map.contains_key(&key) {
            warn!(side, key = ?key, "Duplicate key, keeping first occurrence");
            duplicates += 1;
        } else {
            map.insert(key, item);
        }
    }
    (map, duplicates)
}
