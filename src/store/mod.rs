//! Test directory database access.
//!
//! The core only needs two capabilities from the database, captured by the
//! [`Database`] trait: read every row of a table, and upsert rows by the
//! table's key columns. Rows are plain column-name to string maps; turning
//! them into typed entities is the canonicalizer's job.
//!
//! ## Tables
//!
//! | Table | Key columns |
//! |-------|-------------|
//! | `panels` | `panel_id`, `panel_version` |
//! | `genes` | `hgnc_id` |
//! | `panel_gene_links` | `panel_id`, `panel_version`, `hgnc_id` |
//!
//! Nothing is ever deleted: superseded panel versions and links are
//! upserted again with `status = retired`.
//!
//! [`JsonStore`](json::JsonStore) keeps the tables in a single JSON document
//! and writes every upsert through to disk atomically.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod integrity;
pub mod json;
pub mod rows;

/// A database row: column name to value
pub type Row = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Row {row} for table '{table}' has no value for key column '{column}'")]
    MissingKey {
        table: Table,
        column: &'static str,
        row: usize,
    },

    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// The tables of the test directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Panels,
    Genes,
    PanelGeneLinks,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Panels, Table::Genes, Table::PanelGeneLinks];

    pub fn name(self) -> &'static str {
        match self {
            Self::Panels => "panels",
            Self::Genes => "genes",
            Self::PanelGeneLinks => "panel_gene_links",
        }
    }

    /// Columns identifying a row for upserts
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Panels => &[columns::PANEL_ID, columns::PANEL_VERSION],
            Self::Genes => &[columns::HGNC_ID],
            Self::PanelGeneLinks => &[
                columns::PANEL_ID,
                columns::PANEL_VERSION,
                columns::HGNC_ID,
            ],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| StoreError::UnknownTable(s.to_string()))
    }
}

/// Column names used by the database tables
pub mod columns {
    pub const PANEL_ID: &str = "panel_id";
    pub const PANEL_NAME: &str = "panel_name";
    pub const PANEL_VERSION: &str = "panel_version";
    pub const PANEL_TYPE: &str = "panel_type";
    pub const CLINICAL_INDICATION_CODE: &str = "clinical_indication_code";
    pub const SIGNOFF_DATE: &str = "signoff_date";
    pub const STATUS: &str = "status";
    pub const HGNC_ID: &str = "hgnc_id";
    pub const SYMBOL: &str = "symbol";
    pub const CONFIDENCE_LEVEL: &str = "confidence_level";
    pub const MODE_OF_INHERITANCE: &str = "mode_of_inheritance";
}

/// Read/write access to the test directory tables
pub trait Database {
    /// Return every row of `table`
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the table cannot be read.
    fn read(&self, table: Table) -> Result<Vec<Row>, StoreError>;

    /// Insert or replace `rows` by the table's key columns, returning how many
    /// rows were written
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if a row lacks a key column or the write fails.
    /// A failed call writes nothing.
    fn upsert(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError>;
}

/// Key of `row` in `table`, or the first missing key column
pub(crate) fn row_key(table: Table, row: &Row) -> Result<Vec<String>, &'static str> {
    table
        .key_columns()
        .iter()
        .map(|&column| match row.get(column) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(column),
        })
        .collect()
}
