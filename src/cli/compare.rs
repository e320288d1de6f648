use anyhow::Context;
use clap::Args;

use crate::cli::{print_json, OutputFormat};
use crate::core::genepanels::GenepanelsRow;
use crate::diff::report::write_delimited;
use crate::genepanels::{compare_exports, ExportComparison};
use crate::parsing::files::LocalFileStore;
use crate::parsing::genepanels::read_genepanels;

#[derive(Args)]
pub struct CompareArgs {
    /// Previous genepanels export
    #[arg(required = true)]
    pub previous: String,

    /// New genepanels export
    #[arg(required = true)]
    pub new: String,

    /// Exit with an error when the exports differ
    #[arg(long)]
    pub fail_on_diff: bool,
}

pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let files = LocalFileStore::new();
    let previous = read_export(&files, &args.previous)?;
    let new = read_export(&files, &args.new)?;

    if verbose {
        eprintln!("Previous: {} rows", previous.len());
        eprintln!("New:      {} rows", new.len());
    }

    let comparison = compare_exports(&previous, &new);

    match format {
        OutputFormat::Text => print_text(&args, &comparison),
        OutputFormat::Json => print_json(&comparison)?,
        OutputFormat::Tsv => {
            write_delimited(&comparison.panels.records, std::io::stdout(), b'\t')?;
            write_delimited(&comparison.rows.records, std::io::stdout(), b'\t')?;
        }
    }

    if args.fail_on_diff && !comparison.is_empty() {
        anyhow::bail!(
            "Exports differ: {} panel and {} row differences",
            comparison.panels.summary.total(),
            comparison.rows.summary.total()
        );
    }
    Ok(())
}

fn read_export(files: &LocalFileStore, file_id: &str) -> anyhow::Result<Vec<GenepanelsRow>> {
    read_genepanels(files, file_id).with_context(|| format!("Failed to read genepanels file {file_id}"))
}

fn print_text(args: &CompareArgs, comparison: &ExportComparison) {
    println!("Genepanels Comparison");
    println!("{}", "=".repeat(60));
    println!("\nPrevious: {}", args.previous);
    println!("New:      {}", args.new);

    if comparison.is_empty() {
        println!("\nNo differences.");
        return;
    }

    let panels = &comparison.panels.summary;
    println!("\nPanels:");
    println!("  Added:    {}", panels.missing_left);
    println!("  Removed:  {}", panels.missing_right);
    println!("  Renamed:  {}", panels.value_mismatch);
    for r in &comparison.panels.records {
        match r.field {
            Some(field) => println!(
                "  {} {field}: '{}' -> '{}'",
                r.key,
                r.left_value.as_ref().map(ToString::to_string).unwrap_or_default(),
                r.right_value.as_ref().map(ToString::to_string).unwrap_or_default()
            ),
            None => println!("  {} {}", r.key, r.category),
        }
    }

    let rows = &comparison.rows.summary;
    println!("\nRows:");
    println!("  Added:    {}", rows.missing_left);
    println!("  Removed:  {}", rows.missing_right);
    println!("  Changed:  {}", rows.value_mismatch);
    for r in &comparison.rows.records {
        println!("  {}\t{}\t{}", r.key.0, r.key.1, r.category);
    }
}
