use clap::Args;

use crate::cli::{print_json, OutputFormat, StoreArgs};
use crate::store::integrity::{check, IntegrityReport};

#[derive(Args)]
pub struct CheckDbArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Exit with an error when problems are found
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: CheckDbArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let current = args.store.snapshot()?;
    if verbose {
        eprintln!(
            "Loaded {} panel rows, {} genes, {} links",
            current.panels.len(),
            current.genes.len(),
            current.links.len()
        );
    }

    let report = check(&current);

    match format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Tsv => print_tsv(&report),
    }

    if args.strict && !report.is_clean() {
        anyhow::bail!("{} integrity problem(s) found", report.issue_count());
    }
    Ok(())
}

fn print_text(report: &IntegrityReport) {
    println!("Database Integrity");
    println!("{}", "=".repeat(60));

    if report.is_clean() {
        println!("\nNo problems found.");
        return;
    }

    if !report.panels_without_genes.is_empty() {
        println!("\nCurrent panels without genes:");
        for (panel_id, version) in &report.panels_without_genes {
            println!("  {panel_id} {version}");
        }
    }
    if !report.duplicate_links.is_empty() {
        println!("\nGenes linked more than once:");
        for (panel_id, hgnc_id) in &report.duplicate_links {
            println!("  {panel_id} {hgnc_id}");
        }
    }
    if !report.multiple_current.is_empty() {
        println!("\nPanels with several current versions:");
        for (panel_id, versions) in &report.multiple_current {
            let versions: Vec<String> = versions.iter().map(ToString::to_string).collect();
            println!("  {panel_id} {}", versions.join(", "));
        }
    }
    if !report.orphan_links.is_empty() {
        println!("\nLinks without a panel row:");
        for (panel_id, version, hgnc_id) in &report.orphan_links {
            println!("  {panel_id} {version} {hgnc_id}");
        }
    }
}

fn print_tsv(report: &IntegrityReport) {
    println!("issue\tpanel_id\tpanel_version\thgnc_id");
    for (panel_id, version) in &report.panels_without_genes {
        println!("panel_without_genes\t{panel_id}\t{version}\t");
    }
    for (panel_id, hgnc_id) in &report.duplicate_links {
        println!("duplicate_link\t{panel_id}\t\t{hgnc_id}");
    }
    for (panel_id, versions) in &report.multiple_current {
        for version in versions {
            println!("multiple_current\t{panel_id}\t{version}\t");
        }
    }
    for (panel_id, version, hgnc_id) in &report.orphan_links {
        println!("orphan_link\t{panel_id}\t{version}\t{hgnc_id}");
    }
}
