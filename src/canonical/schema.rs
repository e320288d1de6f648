//! Column schemas for every tabular source the canonicalizer accepts.
//!
//! Each source names its columns differently (`panel-id`, `Panel ID`,
//! `panelapp_id`, ...). Headers are normalized with
//! [`normalize_column_name`] and then matched against a canonical name plus
//! a list of aliases.

use std::collections::{BTreeSet, HashMap};

use crate::store::{columns, Row, Table};
use crate::utils::validation::normalize_column_name;

/// The shape of a batch of rows handed to the canonicalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSchema {
    /// A test directory database table
    Database(Table),
    /// The clinically agreed test directory spreadsheet
    Spreadsheet,
}

impl SourceSchema {
    pub fn name(self) -> &'static str {
        match self {
            Self::Database(table) => table.name(),
            Self::Spreadsheet => "spreadsheet",
        }
    }

    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            Self::Database(Table::Panels) => PANEL_COLUMNS,
            Self::Database(Table::Genes) => GENE_COLUMNS,
            Self::Database(Table::PanelGeneLinks) => LINK_COLUMNS,
            Self::Spreadsheet => SPREADSHEET_COLUMNS,
        }
    }
}

/// One canonical column and the header spellings that map onto it
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// The header must be present
    pub required: bool,
    /// Every row must carry a value (implies `required`)
    pub nonblank: bool,
}

const fn required(name: &'static str, aliases: &'static [&'static str]) -> ColumnSpec {
    ColumnSpec {
        name,
        aliases,
        required: true,
        nonblank: true,
    }
}

/// Header required, but individual cells may be empty
const fn required_header(name: &'static str, aliases: &'static [&'static str]) -> ColumnSpec {
    ColumnSpec {
        name,
        aliases,
        required: true,
        nonblank: false,
    }
}

const fn optional(name: &'static str, aliases: &'static [&'static str]) -> ColumnSpec {
    ColumnSpec {
        name,
        aliases,
        required: false,
        nonblank: false,
    }
}

/// Canonical name of the spreadsheet's free-text gene column
pub const GENES: &str = "genes";

const PANEL_COLUMNS: &[ColumnSpec] = &[
    required(columns::PANEL_ID, &["panelapp_id"]),
    required(columns::PANEL_NAME, &["name"]),
    required(columns::PANEL_VERSION, &["version"]),
    optional(
        columns::CLINICAL_INDICATION_CODE,
        &["clinical_indication_id", "indication_code", "ci_code"],
    ),
    optional(columns::SIGNOFF_DATE, &["signed_off", "signoff"]),
    optional(columns::PANEL_TYPE, &["panel_source", "source"]),
    optional(columns::STATUS, &[]),
];

const GENE_COLUMNS: &[ColumnSpec] = &[
    required(columns::HGNC_ID, &["hgncid"]),
    optional(columns::SYMBOL, &["gene_symbol"]),
    optional(columns::CONFIDENCE_LEVEL, &["confidence"]),
    optional(columns::MODE_OF_INHERITANCE, &["moi", "inheritance"]),
];

const LINK_COLUMNS: &[ColumnSpec] = &[
    required(columns::PANEL_ID, &["panelapp_id"]),
    required(columns::PANEL_VERSION, &["version"]),
    required(columns::HGNC_ID, &["hgncid"]),
    optional(columns::CONFIDENCE_LEVEL, &["confidence"]),
    optional(columns::STATUS, &[]),
];

const SPREADSHEET_COLUMNS: &[ColumnSpec] = &[
    optional(columns::PANEL_ID, &["panelapp_id"]),
    required(columns::PANEL_NAME, &["clinical_indication", "name"]),
    required_header(GENES, &["target_genes", "gene_list", "target"]),
    required(
        columns::CLINICAL_INDICATION_CODE,
        &["clinical_indication_id", "indication_code", "ci_code"],
    ),
    optional(columns::PANEL_VERSION, &["version"]),
    optional(columns::PANEL_TYPE, &["panel_source"]),
    optional(columns::CONFIDENCE_LEVEL, &["confidence"]),
];

/// Maps a row's raw headers onto canonical column names
#[derive(Debug)]
pub struct ColumnMap {
    lookup: HashMap<String, &'static str>,
}

impl ColumnMap {
    pub fn new(schema: SourceSchema) -> Self {
        let mut lookup = HashMap::new();
        for spec in schema.columns() {
            lookup.insert(spec.name.to_string(), spec.name);
            for alias in spec.aliases {
                lookup.entry(normalize_column_name(alias)).or_insert(spec.name);
            }
        }
        Self { lookup }
    }

    /// Re-key `row` by canonical column name; unknown columns are dropped and
    /// blank values are treated as absent
    pub fn canonical_row(&self, row: &Row) -> HashMap<&'static str, String> {
        let mut out = HashMap::new();
        for (header, value) in row {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(&name) = self.lookup.get(&normalize_column_name(header)) {
                out.entry(name).or_insert_with(|| value.to_string());
            }
        }
        out
    }

    /// Canonical columns mentioned by any header of `rows`
    pub fn columns_present(&self, rows: &[Row]) -> BTreeSet<&'static str> {
        rows.iter()
            .flat_map(|row| row.keys())
            .filter_map(|header| self.lookup.get(&normalize_column_name(header)).copied())
            .collect()
    }
}
