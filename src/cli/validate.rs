use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::canonical::schema::SourceSchema;
use crate::canonical::{canonicalize, AmbiguityPolicy, CanonicalSet};
use crate::cli::{load_resolver, print_json, OutputFormat, StoreArgs};
use crate::core::gene::PanelGeneLink;
use crate::core::snapshot::Snapshot;
use crate::core::types::{HgncId, PanelId};
use crate::diff::report::{write_csv, write_delimited};
use crate::diff::tracked::IndicationView;
use crate::diff::{compare, keys, Comparison};
use crate::parsing::files::LocalFileStore;
use crate::parsing::spreadsheet::load_spreadsheet;
use crate::store::columns;

#[derive(Args)]
pub struct ValidateArgs {
    /// Test directory spreadsheet (CSV, or TSV for .tsv/.txt)
    #[arg(required = true)]
    pub spreadsheet: String,

    #[command(flatten)]
    pub store: StoreArgs,

    /// HGNC complete set used to resolve gene symbols (defaults to the genes table)
    #[arg(long)]
    pub hgnc: Option<String>,

    /// Also write the panel and gene differences as CSV files into this directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

/// Spreadsheet (left) against database (right)
#[derive(Debug, Serialize)]
struct SpreadsheetReport {
    panels: Comparison<PanelId>,
    genes: Comparison<(PanelId, HgncId)>,
    skipped_rows: usize,
}

pub fn run(args: ValidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let files = LocalFileStore::new();
    let current = args.store.snapshot()?;
    let resolver = load_resolver(&files, args.hgnc.as_deref(), &current)?;

    let rows = load_spreadsheet(&files, &args.spreadsheet)
        .with_context(|| format!("Failed to read spreadsheet {}", args.spreadsheet))?;
    let sheet = canonicalize(&rows, SourceSchema::Spreadsheet, Some(&resolver), AmbiguityPolicy::Skip)
        .with_context(|| format!("Spreadsheet {} does not fit the expected layout", args.spreadsheet))?;

    if verbose {
        eprintln!(
            "Spreadsheet: {} rows, {} panels, {} gene links ({} rows skipped)",
            rows.len(),
            sheet.snapshot.panels.len(),
            sheet.snapshot.links.len(),
            sheet.skipped.len()
        );
    }

    let report = compare_with_database(&sheet, &current);

    if let Some(dir) = &args.report_dir {
        std::fs::create_dir_all(dir)?;
        let panels = std::fs::File::create(dir.join("panel_differences.csv"))?;
        write_csv(&report.panels.records, panels)?;
        let genes = std::fs::File::create(dir.join("gene_differences.csv"))?;
        write_csv(&report.genes.records, genes)?;
    }

    match format {
        OutputFormat::Text => print_text(&args, &report, &sheet),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Tsv => {
            write_delimited(&report.panels.records, std::io::stdout(), b'\t')?;
            write_delimited(&report.genes.records, std::io::stdout(), b'\t')?;
        }
    }

    Ok(())
}

/// Panels by indication view, then gene links of the panels the spreadsheet
/// lists genes for
fn compare_with_database(sheet: &CanonicalSet, current: &Snapshot) -> SpreadsheetReport {
    let compare_version = sheet.columns_present.contains(columns::PANEL_VERSION);
    let panels = compare(
        &IndicationView::current(&sheet.snapshot.panels, compare_version),
        &IndicationView::current(&current.panels, compare_version),
        keys::indication,
    );

    let with_genes: BTreeSet<&PanelId> = sheet.snapshot.links.iter().map(|l| &l.panel_id).collect();
    let db_links: Vec<PanelGeneLink> = current
        .links
        .iter()
        .filter(|l| {
            l.is_current()
                && with_genes.contains(&l.panel_id)
                && current.current_version(&l.panel_id) == Some(l.panel_version)
        })
        .cloned()
        .collect();
    let genes = compare(&sheet.snapshot.links, &db_links, keys::panel_gene);

    SpreadsheetReport {
        panels,
        genes,
        skipped_rows: sheet.skipped.len(),
    }
}

fn print_text(args: &ValidateArgs, report: &SpreadsheetReport, sheet: &CanonicalSet) {
    println!("Spreadsheet Validation");
    println!("{}", "=".repeat(60));
    println!("\nSpreadsheet: {}", args.spreadsheet);
    println!("Database:    {}", args.store.store.display());

    for (title, summary) in [
        ("Panels", &report.panels.summary),
        ("Genes", &report.genes.summary),
    ] {
        println!("\n{title}:");
        println!("  Only in database:    {}", summary.missing_left);
        println!("  Only in spreadsheet: {}", summary.missing_right);
        println!("  Value mismatches:    {}", summary.value_mismatch);
        if summary.duplicate_keys > 0 {
            println!("  Duplicate keys:      {}", summary.duplicate_keys);
        }
    }

    if !report.panels.records.is_empty() {
        println!("\nPanel differences:");
        for r in &report.panels.records {
            match r.field {
                Some(field) => println!(
                    "  {} {field}: '{}' vs '{}'",
                    r.key,
                    r.left_value.as_ref().map(ToString::to_string).unwrap_or_default(),
                    r.right_value.as_ref().map(ToString::to_string).unwrap_or_default()
                ),
                None => println!("  {} {}", r.key, r.category),
            }
        }
    }

    if !report.genes.records.is_empty() {
        println!("\nGene differences:");
        for r in &report.genes.records {
            println!("  {} {} {}", r.key.0, r.key.1, r.category);
        }
    }

    if !sheet.skipped.is_empty() {
        println!("\nSkipped rows (unresolved genes):");
        for skipped in &sheet.skipped {
            println!("  {skipped}");
        }
    }

    if report.panels.is_empty() && report.genes.is_empty() {
        println!("\nSpreadsheet and database agree.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::resolver::GeneResolver;
    use crate::core::panel::Panel;
    use crate::core::types::{Confidence, PanelVersion};
    use crate::diff::DiffCategory;
    use crate::store::Row;

    fn sheet_row(code: &str, name: &str, genes: &str) -> Row {
        [
            ("clinical_indication_id", code),
            ("clinical_indication", name),
            ("target_genes", genes),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_spreadsheet_against_database() {
        let v = PanelVersion::new(2, 0);
        let current = Snapshot::new(
            vec![
                Panel::new("R1", "Familial hypercholesterolaemia", v).with_indication("R1"),
                Panel::new("486", "Paediatric disorders", v).with_indication("R27"),
            ],
            vec![],
            vec![
                PanelGeneLink::new(PanelId::new("R1"), v, HgncId::new(6547), Confidence::Green),
                PanelGeneLink::new(PanelId::new("R1"), v, HgncId::new(603), Confidence::Green),
            ],
        );
        let mut resolver = GeneResolver::new();
        resolver.insert("LDLR", HgncId::new(6547));

        let rows = vec![
            sheet_row("R1", "Familial hypercholesterolaemia", "LDLR"),
            sheet_row("R27", "Paediatric disorders", "Paediatric disorders (486)"),
        ];
        let sheet =
            canonicalize(&rows, SourceSchema::Spreadsheet, Some(&resolver), AmbiguityPolicy::Skip).unwrap();
        let report = compare_with_database(&sheet, &current);

        // Versions are not compared: the spreadsheet has no version column
        assert!(report.panels.is_empty(), "{:?}", report.panels.records);
        assert_eq!(report.genes.records.len(), 1);
        assert_eq!(report.genes.records[0].key.1, HgncId::new(603));
        assert_eq!(report.genes.records[0].category, DiffCategory::MissingLeft);
    }
}
