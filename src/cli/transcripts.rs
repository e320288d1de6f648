use anyhow::Context;
use clap::Args;

use crate::cli::{print_json, OutputFormat};
use crate::parsing::files::LocalFileStore;
use crate::parsing::g2t::read_g2t;
use crate::parsing::genepanels::read_genepanels;
use crate::transcripts::validate;

#[derive(Args)]
pub struct CheckTranscriptsArgs {
    /// Genepanels export to check
    #[arg(required = true)]
    pub genepanels: String,

    /// Gene-to-transcript table
    #[arg(required = true)]
    pub g2t: String,
}

pub fn run(args: CheckTranscriptsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let files = LocalFileStore::new();
    let rows = read_genepanels(&files, &args.genepanels)
        .with_context(|| format!("Failed to read genepanels file {}", args.genepanels))?;
    let mappings = read_g2t(&files, &args.g2t)
        .with_context(|| format!("Failed to read transcript table {}", args.g2t))?;

    if verbose {
        eprintln!(
            "{} export rows, {} clinical transcripts",
            rows.len(),
            mappings.len()
        );
    }

    let report = validate(&rows, &mappings);

    match format {
        OutputFormat::Text => {
            println!("Transcript Coverage");
            println!("{}", "=".repeat(60));
            println!("\nGenes covered: {}", report.covered);
            println!("Genes missing: {}", report.missing.len());
            for id in &report.missing {
                println!("  {id}");
            }
        }
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Tsv => {
            println!("hgnc_id\tstatus");
            for id in &report.missing {
                println!("{id}\tmissing");
            }
        }
    }

    report
        .ensure_promotable()
        .with_context(|| format!("{} cannot be promoted", args.genepanels))?;
    Ok(())
}
