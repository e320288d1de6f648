use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::canonical::registry::from_registry;
use crate::canonical::AmbiguityPolicy;
use crate::cli::{load_resolver, print_json, OutputFormat, StoreArgs};
use crate::core::types::Confidence;
use crate::parsing::files::LocalFileStore;
use crate::planner::{apply, plan, registry_panels, ApplyResult, ChangeSet, PanelOutcome, PlannerConfig};
use crate::registry::panelapp::PanelAppClient;
use crate::registry::snapshot::SnapshotRegistry;
use crate::registry::{fetch_snapshot, FetchFailure, RegistryConfig, RegistrySnapshot, DEFAULT_BASE_URL};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Lowest registry confidence written to the database (red, amber, green)
    #[arg(long, default_value = "green")]
    pub min_confidence: Confidence,

    /// Write the planned changes (the default is a dry run)
    #[arg(long)]
    pub no_dry_run: bool,

    /// Plan against a saved registry snapshot instead of the live registry
    #[arg(long)]
    pub registry_snapshot: Option<PathBuf>,

    /// Save the registry snapshot used for this run
    #[arg(long)]
    pub save_snapshot: Option<PathBuf>,

    /// PanelApp API root
    #[arg(long, env = "TD_SYNC_PANELAPP_URL", default_value = DEFAULT_BASE_URL)]
    pub panelapp_url: String,

    /// Registry request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// HGNC complete set used to resolve registry genes without an HGNC id
    #[arg(long)]
    pub hgnc: Option<String>,

    /// Write the planned operations as CSV
    #[arg(long)]
    pub changes: Option<PathBuf>,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    changes: &'a ChangeSet,
    result: &'a ApplyResult,
    fetch_failures: &'a [FetchFailure],
}

pub fn run(args: PlanArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = PlannerConfig {
        min_confidence: args.min_confidence,
        dry_run: !args.no_dry_run,
    };
    let files = LocalFileStore::new();
    let (mut store, current) = args.store.open()?;

    let panel_ids = registry_panels(&current);
    if verbose {
        eprintln!("Asking the registry about {} panels", panel_ids.len());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let snapshot = match &args.registry_snapshot {
        Some(path) => {
            let saved = RegistrySnapshot::load(path)
                .with_context(|| format!("Failed to load registry snapshot {}", path.display()))?;
            let registry = SnapshotRegistry::from_snapshot(saved);
            runtime.block_on(fetch_snapshot(&registry, &panel_ids))
        }
        None => {
            let registry_config = RegistryConfig {
                timeout: Duration::from_secs(args.timeout),
                ..RegistryConfig::default()
            }
            .with_base_url(&args.panelapp_url);
            let client = PanelAppClient::new(&registry_config)?;
            runtime.block_on(fetch_snapshot(&client, &panel_ids))
        }
    };

    if let Some(path) = &args.save_snapshot {
        snapshot
            .save(path)
            .with_context(|| format!("Failed to save registry snapshot {}", path.display()))?;
    }

    let resolver = load_resolver(&files, args.hgnc.as_deref(), &current)?;
    let authoritative = from_registry(&snapshot.definitions, Some(&resolver), AmbiguityPolicy::Abort)
        .context("Registry content could not be canonicalized")?
        .snapshot;

    let changes = plan(&current, &authoritative, config.min_confidence);
    if let Some(path) = &args.changes {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        changes.write_csv(file)?;
    }

    let result = apply(&changes, &mut store, config.dry_run);

    match format {
        OutputFormat::Text => print_text(&changes, &result, &snapshot.failures),
        OutputFormat::Json => print_json(&PlanOutput {
            changes: &changes,
            result: &result,
            fetch_failures: &snapshot.failures,
        })?,
        OutputFormat::Tsv => changes.write_csv(std::io::stdout())?,
    }

    result.into_result()?;
    Ok(())
}

fn print_text(changes: &ChangeSet, result: &ApplyResult, fetch_failures: &[FetchFailure]) {
    let mode = if result.dry_run { "Dry run" } else { "Applied" };
    println!("Registry Update Plan ({mode})");
    println!("{}", "=".repeat(60));

    for panel in &changes.panels {
        match &panel.outcome {
            PanelOutcome::AlreadyCurrent {
                db_version,
                registry_version,
            } => println!(
                "  {:<8} up to date (database {db_version}, registry {registry_version})",
                panel.panel_id.as_str()
            ),
            PanelOutcome::NoQualifyingGenes { registry_version } => println!(
                "  {:<8} skipped: version {registry_version} has no qualifying genes",
                panel.panel_id.as_str()
            ),
            PanelOutcome::Update { from, to, operations } => {
                let from = from.map_or_else(|| "new".to_string(), |v| v.to_string());
                println!(
                    "  {:<8} {from} -> {to} ({} operations)",
                    panel.panel_id.as_str(),
                    operations.len()
                );
            }
        }
    }

    println!("\nPanels updated:   {}", result.updated.len());
    println!("Panels unchanged: {}", result.unchanged.len());
    println!(
        "Rows {}: {}",
        if result.dry_run { "to write" } else { "written" },
        result.rows_written
    );

    if !fetch_failures.is_empty() {
        println!("\nRegistry fetch failures:");
        for failure in fetch_failures {
            println!("  {}: {}", failure.panel_id, failure.error);
        }
    }
    if !result.failures.is_empty() {
        println!("\nApply failures:");
        for failure in &result.failures {
            println!("  {}: {}", failure.panel_id, failure.error);
        }
    }
}
