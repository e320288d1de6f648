use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{OutputFormat, StoreArgs};
use crate::genepanels::export::{default_file_name, write_genepanels};
use crate::genepanels::{build_with_layout, Layout};

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Column layout of the export
    #[arg(long, default_value = "default")]
    pub layout: Layout,

    /// Output file (defaults to {yymmdd}_genepanels.tsv in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: BuildArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let current = args.store.snapshot()?;
    let rows = build_with_layout(&current.panels, &current.links, args.layout)
        .context("Test directory cannot be exported")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_file_name(chrono::Local::now().date_naive())));
    let file = std::fs::File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let digest = write_genepanels(&rows, args.layout, std::io::BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let panels = rows.iter().map(|r| &r.panel_id).collect::<BTreeSet<_>>().len();
    if verbose {
        eprintln!("Layout: {:?}", args.layout);
    }

    match format {
        OutputFormat::Text => {
            println!("Wrote {} rows for {panels} panels to {}", rows.len(), output.display());
            println!("MD5: {digest}");
        }
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "path": output.display().to_string(),
                "rows": rows.len(),
                "panels": panels,
                "md5": digest,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Tsv => {
            println!("path\trows\tpanels\tmd5");
            println!("{}\t{}\t{panels}\t{digest}", output.display(), rows.len());
        }
    }

    Ok(())
}
