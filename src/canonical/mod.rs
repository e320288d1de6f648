//! Normalization of every source into canonical panels, genes and links.
//!
//! Three shapes of panel content reach the pipeline:
//!
//! - database tables (`panels`, `genes`, `panel_gene_links`)
//! - the test directory spreadsheet, one row per clinical indication with a
//!   free-text gene list
//! - registry panel definitions (see [`registry::from_registry`])
//!
//! All of them come out as a [`Snapshot`]. Column names are matched through
//! [`schema::ColumnMap`], gene tokens through [`resolver::GeneResolver`].
//!
//! Nothing here mutates its inputs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::panel::Panel;
use crate::core::snapshot::Snapshot;
use crate::core::types::{
    parse_date, Confidence, HgncId, PanelId, PanelSource, PanelVersion, RecordStatus, ValueError,
};
use crate::store::{columns, Database, Row, StoreError, Table};
use crate::utils::validation::split_gene_list;

pub mod registry;
pub mod resolver;
pub mod schema;

use resolver::{resolve_token, GeneResolver};
use schema::{ColumnMap, SourceSchema, GENES};

/// A source row does not fit its schema; always fatal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{input}: missing required column '{column}'")]
    MissingColumn {
        input: &'static str,
        column: &'static str,
    },

    #[error("{input} row {row}: no value for required column '{column}'")]
    MissingValue {
        input: &'static str,
        column: &'static str,
        row: usize,
    },

    #[error("{input} row {row}: bad value in column '{column}': {error}")]
    InvalidValue {
        input: &'static str,
        column: &'static str,
        row: usize,
        error: ValueError,
    },
}

/// A gene token that resolves to zero or several HGNC ids
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot resolve gene '{symbol}' to a single HGNC id ({} candidates)", .candidates.len())]
pub struct AmbiguousGeneError {
    pub symbol: String,
    pub candidates: Vec<HgncId>,
    /// 1-based row (or definition) the token came from
    pub row: Option<usize>,
    pub panel_id: Option<PanelId>,
}

impl AmbiguousGeneError {
    pub fn new(symbol: impl Into<String>, candidates: Vec<HgncId>) -> Self {
        Self {
            symbol: symbol.into(),
            candidates,
            row: None,
            panel_id: None,
        }
    }

    #[must_use]
    pub fn at(mut self, row: usize, panel_id: &PanelId) -> Self {
        self.row = Some(row);
        self.panel_id = Some(panel_id.clone());
        self
    }
}

#[derive(Error, Debug)]
pub enum CanonicalizeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    AmbiguousGene(#[from] AmbiguousGeneError),

    #[error("Failed to read test directory: {0}")]
    Store(#[from] StoreError),
}

/// What to do with a gene token that cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Record the offending row and carry on (read-only comparisons)
    #[default]
    Skip,
    /// Fail on the first ambiguity (anything that writes)
    Abort,
}

/// Canonical output of one source
#[derive(Debug, Clone, Default)]
pub struct CanonicalSet {
    pub snapshot: Snapshot,
    /// Rows left out because a gene could not be resolved
    pub skipped: Vec<AmbiguousGeneError>,
    /// Canonical columns the input actually carried
    pub columns_present: BTreeSet<&'static str>,
}

impl CanonicalSet {
    /// Record a skipped row, or fail under [`AmbiguityPolicy::Abort`]
    fn skip_or_abort(
        &mut self,
        error: AmbiguousGeneError,
        policy: AmbiguityPolicy,
    ) -> Result<(), CanonicalizeError> {
        match policy {
            AmbiguityPolicy::Abort => Err(error.into()),
            AmbiguityPolicy::Skip => {
                warn!(
                    symbol = %error.symbol,
                    row = ?error.row,
                    candidates = error.candidates.len(),
                    "Skipping row with unresolvable gene"
                );
                self.skipped.push(error);
                Ok(())
            }
        }
    }
}

/// Canonicalize a batch of tabular rows
///
/// Row numbers in errors are 1-based. An empty batch yields an empty set.
///
/// # Errors
///
/// Returns `CanonicalizeError::Schema` if a required column is absent or a
/// value cannot be parsed, and `CanonicalizeError::AmbiguousGene` for an
/// unresolvable gene under [`AmbiguityPolicy::Abort`].
pub fn canonicalize(
    rows: &[Row],
    schema: SourceSchema,
    resolver: Option<&GeneResolver>,
    policy: AmbiguityPolicy,
) -> Result<CanonicalSet, CanonicalizeError> {
    let map = ColumnMap::new(schema);
    let mut set = CanonicalSet {
        columns_present: map.columns_present(rows),
        ..CanonicalSet::default()
    };
    if rows.is_empty() {
        return Ok(set);
    }

    let input = schema.name();
    if let Some(spec) = schema
        .columns()
        .iter()
        .find(|spec| spec.required && !set.columns_present.contains(spec.name))
    {
        return Err(SchemaError::MissingColumn {
            input,
            column: spec.name,
        }
        .into());
    }

    let mut spreadsheet = SpreadsheetState::default();
    for (index, raw) in rows.iter().enumerate() {
        let fields = Fields {
            input,
            row: index + 1,
            values: map.canonical_row(raw),
        };
        for spec in schema.columns().iter().filter(|spec| spec.nonblank) {
            fields.require(spec.name)?;
        }

        match schema {
            SourceSchema::Database(Table::Panels) => set.snapshot.panels.push(panel_from(&fields)?),
            SourceSchema::Database(Table::Genes) => set.snapshot.genes.push(gene_from(&fields)?),
            SourceSchema::Database(Table::PanelGeneLinks) => {
                set.snapshot.links.push(link_from(&fields)?);
            }
            SourceSchema::Spreadsheet => {
                spreadsheet.add_row(&fields, resolver, policy, &mut set)?;
            }
        }
    }

    if schema == SourceSchema::Spreadsheet {
        set.snapshot.genes = spreadsheet.genes.into_values().collect();
    }
    debug!(
        input,
        panels = set.snapshot.panels.len(),
        genes = set.snapshot.genes.len(),
        links = set.snapshot.links.len(),
        skipped = set.skipped.len(),
        "Canonicalized rows"
    );
    Ok(set)
}

/// Read and canonicalize every table of the test directory
///
/// # Errors
///
/// Returns `CanonicalizeError::Store` if a table cannot be read and
/// `CanonicalizeError::Schema` if a stored row is malformed.
pub fn load_database(db: &impl Database) -> Result<Snapshot, CanonicalizeError> {
    let mut snapshot = Snapshot::default();
    for table in Table::ALL {
        let rows = db.read(table)?;
        let set = canonicalize(&rows, SourceSchema::Database(table), None, AmbiguityPolicy::Abort)?;
        snapshot.extend(set.snapshot);
    }
    Ok(snapshot)
}

/// One canonicalized row plus enough context to report errors against it
struct Fields {
    input: &'static str,
    row: usize,
    values: HashMap<&'static str, String>,
}

impl Fields {
    fn get(&self, column: &'static str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    fn require(&self, column: &'static str) -> Result<&str, SchemaError> {
        self.get(column).ok_or(SchemaError::MissingValue {
            input: self.input,
            column,
            row: self.row,
        })
    }

    fn parse<T>(&self, column: &'static str) -> Result<Option<T>, SchemaError>
    where
        T: FromStr<Err = ValueError>,
    {
        self.get(column)
            .map(|value| value.parse())
            .transpose()
            .map_err(|error| self.invalid(column, error))
    }

    fn parse_required<T>(&self, column: &'static str) -> Result<T, SchemaError>
    where
        T: FromStr<Err = ValueError>,
    {
        self.require(column)?
            .parse()
            .map_err(|error| self.invalid(column, error))
    }

    fn invalid(&self, column: &'static str, error: ValueError) -> SchemaError {
        SchemaError::InvalidValue {
            input: self.input,
            column,
            row: self.row,
            error,
        }
    }
}

fn panel_from(fields: &Fields) -> Result<Panel, SchemaError> {
    let mut panel = Panel::new(
        fields.require(columns::PANEL_ID)?,
        fields.require(columns::PANEL_NAME)?,
        fields.parse_required(columns::PANEL_VERSION)?,
    );
    if let Some(source) = fields.parse::<PanelSource>(columns::PANEL_TYPE)? {
        panel = panel.with_source(source);
    }
    if let Some(status) = fields.parse::<RecordStatus>(columns::STATUS)? {
        panel = panel.with_status(status);
    }
    if let Some(code) = fields.get(columns::CLINICAL_INDICATION_CODE) {
        panel = panel.with_indication(code);
    }
    if let Some(date) = fields.get(columns::SIGNOFF_DATE) {
        let date = parse_date(date).map_err(|error| fields.invalid(columns::SIGNOFF_DATE, error))?;
        panel = panel.with_signoff_date(date);
    }
    Ok(panel)
}

fn gene_from(fields: &Fields) -> Result<Gene, SchemaError> {
    let confidence = fields
        .parse::<Confidence>(columns::CONFIDENCE_LEVEL)?
        .unwrap_or(Confidence::Green);
    let mut gene = Gene::new(fields.parse_required(columns::HGNC_ID)?, confidence);
    if let Some(symbol) = fields.get(columns::SYMBOL) {
        gene = gene.with_symbol(symbol);
    }
    if let Some(moi) = fields.get(columns::MODE_OF_INHERITANCE) {
        gene = gene.with_inheritance(moi);
    }
    Ok(gene)
}

fn link_from(fields: &Fields) -> Result<PanelGeneLink, SchemaError> {
    let mut link = PanelGeneLink::new(
        PanelId::new(fields.require(columns::PANEL_ID)?),
        fields.parse_required(columns::PANEL_VERSION)?,
        fields.parse_required(columns::HGNC_ID)?,
        fields
            .parse::<Confidence>(columns::CONFIDENCE_LEVEL)?
            .unwrap_or(Confidence::Green),
    );
    if let Some(status) = fields.parse::<RecordStatus>(columns::STATUS)? {
        link.status = status;
    }
    Ok(link)
}

/// Registry panel id embedded in a target cell, e.g. `Cardiac arrhythmia (749)`
pub fn panel_marker(text: &str) -> Option<PanelId> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    let marker = MARKER.get_or_init(|| Regex::new(r"\((\d+)\)").ok()).as_ref()?;
    marker
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| PanelId::new(m.as_str()))
}

/// Cross-row state while canonicalizing a spreadsheet
#[derive(Default)]
struct SpreadsheetState {
    genes: BTreeMap<HgncId, Gene>,
    seen_panels: BTreeSet<PanelId>,
}

impl SpreadsheetState {
    fn add_row(
        &mut self,
        fields: &Fields,
        resolver: Option<&GeneResolver>,
        policy: AmbiguityPolicy,
        set: &mut CanonicalSet,
    ) -> Result<(), CanonicalizeError> {
        let code = fields.require(columns::CLINICAL_INDICATION_CODE)?;
        let genes_text = fields.get(GENES);
        let marker = genes_text.and_then(panel_marker);

        let panel_id = fields
            .get(columns::PANEL_ID)
            .map(PanelId::new)
            .or_else(|| marker.clone())
            .unwrap_or_else(|| PanelId::new(code));

        if self.seen_panels.contains(&panel_id) {
            warn!(panel_id = %panel_id, row = fields.row, "Panel listed more than once, keeping first row");
            return Ok(());
        }

        let version = fields
            .parse::<PanelVersion>(columns::PANEL_VERSION)?
            .unwrap_or(PanelVersion::UNVERSIONED);
        let confidence = fields
            .parse::<Confidence>(columns::CONFIDENCE_LEVEL)?
            .unwrap_or(Confidence::Green);

        let mut panel = Panel::new(panel_id.as_str(), fields.require(columns::PANEL_NAME)?, version)
            .with_indication(code);
        if let Some(source) = fields.parse::<PanelSource>(columns::PANEL_TYPE)? {
            panel = panel.with_source(source);
        }

        // A registry reference stands in for the gene list
        let tokens = match (genes_text, &marker) {
            (Some(text), None) => split_gene_list(text),
            _ => Vec::new(),
        };

        let mut resolved = Vec::with_capacity(tokens.len());
        for token in tokens {
            match resolve_token(resolver, token) {
                Ok(hgnc_id) => resolved.push((token, hgnc_id)),
                Err(error) => {
                    set.skip_or_abort(error.at(fields.row, &panel_id), policy)?;
                    return Ok(());
                }
            }
        }

        let mut linked = BTreeSet::new();
        for (token, hgnc_id) in resolved {
            if !linked.insert(hgnc_id) {
                continue;
            }
            set.snapshot
                .links
                .push(PanelGeneLink::new(panel_id.clone(), version, hgnc_id, confidence));
            let gene = self
                .genes
                .entry(hgnc_id)
                .or_insert_with(|| Gene::new(hgnc_id, confidence));
            if gene.symbol.is_none() && !HgncId::looks_like_id(token) {
                gene.symbol = Some(token.to_string());
            }
        }

        self.seen_panels.insert(panel_id);
        set.snapshot.panels.push(panel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::json::JsonStore;
    use crate::store::rows::{link_row, panel_row};

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolver() -> GeneResolver {
        let mut resolver = GeneResolver::new();
        resolver.insert("LDLR", HgncId::new(6547));
        resolver.insert("APOB", HgncId::new(603));
        resolver
    }

    #[test]
    fn test_database_panel_rows() {
        let rows = vec![row(&[
            ("Panel ID", "486"),
            ("panel-name", "Paediatric disorders"),
            ("version", "3"),
            ("signoff_date", "2024-05-01"),
        ])];
        let set = canonicalize(
            &rows,
            SourceSchema::Database(Table::Panels),
            None,
            AmbiguityPolicy::Abort,
        )
        .unwrap();
        let panel = &set.snapshot.panels[0];
        assert_eq!(panel.panel_id, PanelId::new("486"));
        assert_eq!(panel.version, PanelVersion::new(3, 0));
        assert_eq!(panel.source, PanelSource::PanelApp);
        assert!(panel.is_current());
        assert!(panel.signoff_date.is_some());
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let rows = vec![row(&[("panel_id", "486"), ("panel_name", "A")])];
        let err = canonicalize(
            &rows,
            SourceSchema::Database(Table::Panels),
            None,
            AmbiguityPolicy::Skip,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CanonicalizeError::Schema(SchemaError::MissingColumn {
                column: columns::PANEL_VERSION,
                ..
            })
        ));
    }

    #[test]
    fn test_blank_required_value_reports_row() {
        let rows = vec![
            row(&[("panel_id", "486"), ("panel_name", "A"), ("panel_version", "1.0")]),
            row(&[("panel_id", ""), ("panel_name", "B"), ("panel_version", "1.0")]),
        ];
        let err = canonicalize(
            &rows,
            SourceSchema::Database(Table::Panels),
            None,
            AmbiguityPolicy::Skip,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CanonicalizeError::Schema(SchemaError::MissingValue { row: 2, .. })
        ));
    }

    #[test]
    fn test_link_confidence_vocabulary() {
        let rows = vec![
            row(&[("panel_id", "1"), ("panel_version", "1.0"), ("hgnc_id", "HGNC:1"), ("confidence", "3")]),
            row(&[("panel_id", "1"), ("panel_version", "1.0"), ("hgnc_id", "2"), ("confidence", "Amber")]),
        ];
        let set = canonicalize(
            &rows,
            SourceSchema::Database(Table::PanelGeneLinks),
            None,
            AmbiguityPolicy::Abort,
        )
        .unwrap();
        let levels: Vec<Confidence> = set.snapshot.links.iter().map(|l| l.confidence_level).collect();
        assert_eq!(levels, vec![Confidence::Green, Confidence::Amber]);
        assert_eq!(set.snapshot.links[1].hgnc_id, HgncId::new(2));
    }

    #[test]
    fn test_invalid_confidence_is_schema_error() {
        let rows = vec![row(&[
            ("panel_id", "1"),
            ("panel_version", "1.0"),
            ("hgnc_id", "HGNC:1"),
            ("confidence_level", "purple"),
        ])];
        let err = canonicalize(
            &rows,
            SourceSchema::Database(Table::PanelGeneLinks),
            None,
            AmbiguityPolicy::Abort,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CanonicalizeError::Schema(SchemaError::InvalidValue {
                column: columns::CONFIDENCE_LEVEL,
                row: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_spreadsheet_gene_list_and_panel_marker() {
        let rows = vec![
            row(&[
                ("Clinical indication ID", "R134"),
                ("Clinical Indication", "Familial hypercholesterolaemia"),
                ("Target/Genes", "LDLR; APOB, HGNC:6547"),
            ]),
            row(&[
                ("Clinical indication ID", "R27"),
                ("Clinical Indication", "Paediatric disorders"),
                ("Target/Genes", "Paediatric disorders (486)"),
            ]),
        ];
        let set = canonicalize(
            &rows,
            SourceSchema::Spreadsheet,
            Some(&resolver()),
            AmbiguityPolicy::Skip,
        )
        .unwrap();

        let ids: Vec<&str> = set.snapshot.panels.iter().map(|p| p.panel_id.as_str()).collect();
        assert_eq!(ids, vec!["R134", "486"]);
        assert_eq!(set.snapshot.panels[0].source, PanelSource::Local);
        assert_eq!(set.snapshot.panels[1].source, PanelSource::PanelApp);
        assert_eq!(set.snapshot.panels[1].clinical_indication_code.as_deref(), Some("R27"));

        // LDLR and HGNC:6547 are the same gene
        assert_eq!(set.snapshot.links.len(), 2);
        assert!(set.snapshot.links.iter().all(|l| l.confidence_level == Confidence::Green));
        assert_eq!(set.snapshot.genes.len(), 2);
        assert!(!set.columns_present.contains(columns::PANEL_VERSION));
    }

    #[test]
    fn test_spreadsheet_ambiguity_policies() {
        let rows = vec![
            row(&[("ci_code", "R1"), ("name", "One"), ("genes", "LDLR, NOTAGENE")]),
            row(&[("ci_code", "R2"), ("name", "Two"), ("genes", "APOB")]),
        ];

        let set = canonicalize(
            &rows,
            SourceSchema::Spreadsheet,
            Some(&resolver()),
            AmbiguityPolicy::Skip,
        )
        .unwrap();
        assert_eq!(set.skipped.len(), 1);
        assert_eq!(set.skipped[0].symbol, "NOTAGENE");
        assert_eq!(set.skipped[0].row, Some(1));
        assert_eq!(set.snapshot.panels.len(), 1);
        assert_eq!(set.snapshot.panels[0].panel_id, PanelId::new("R2"));

        let err = canonicalize(
            &rows,
            SourceSchema::Spreadsheet,
            Some(&resolver()),
            AmbiguityPolicy::Abort,
        )
        .unwrap_err();
        assert!(matches!(err, CanonicalizeError::AmbiguousGene(_)));
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        let set = canonicalize(&[], SourceSchema::Spreadsheet, None, AmbiguityPolicy::Abort).unwrap();
        assert!(set.snapshot.is_empty());
    }

    #[test]
    fn test_load_database_round_trips_rows() {
        let mut store = JsonStore::new();
        let panel = Panel::new("486", "A", PanelVersion::new(2, 0));
        let link = PanelGeneLink::new(
            PanelId::new("486"),
            PanelVersion::new(2, 0),
            HgncId::new(1),
            Confidence::Green,
        );
        store.upsert(Table::Panels, &[panel_row(&panel)]).unwrap();
        store.upsert(Table::PanelGeneLinks, &[link_row(&link)]).unwrap();

        let snapshot = load_database(&store).unwrap();
        assert_eq!(snapshot.panels, vec![panel]);
        assert_eq!(snapshot.links, vec![link]);
        assert!(snapshot.genes.is_empty());
    }

    #[test]
    fn test_panel_marker() {
        assert_eq!(panel_marker("Arrhythmia (749)"), Some(PanelId::new("749")));
        assert_eq!(panel_marker("LDLR, APOB"), None);
    }
}
