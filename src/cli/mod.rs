//! Command-line interface for td-sync.
//!
//! Available commands:
//!
//! - **validate-spreadsheet**: Compare the test directory spreadsheet with the database
//! - **plan**: Plan (and optionally apply) registry updates to the database
//! - **build**: Write a genepanels export from the database
//! - **compare**: Compare two genepanels exports
//! - **check-transcripts**: Check that every export gene has a clinical transcript
//! - **check-db**: Report integrity problems in the database
//!
//! ## Usage
//!
//! ```text
//! # Preview registry updates (dry run is the default)
//! td-sync plan --store td.json
//!
//! # Apply them, against a saved registry response
//! td-sync plan --store td.json --registry-snapshot panelapp.json --no-dry-run
//!
//! # Build and check a new export
//! td-sync build --store td.json --output 240501_genepanels.tsv
//! td-sync check-transcripts 240501_genepanels.tsv g2t.tsv
//!
//! # What changed since the last export, as JSON
//! td-sync compare 240401_genepanels.tsv 240501_genepanels.tsv --format json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::canonical::{load_database, resolver::GeneResolver};
use crate::core::snapshot::Snapshot;
use crate::parsing::files::LocalFileStore;
use crate::parsing::hgnc::load_hgnc;
use crate::store::json::JsonStore;

pub mod build;
pub mod check_db;
pub mod compare;
pub mod plan;
pub mod transcripts;
pub mod validate;

#[derive(Parser)]
#[command(name = "td-sync")]
#[command(author = "East GLH Bioinformatics")]
#[command(version)]
#[command(about = "Keep the genomic test directory in line with its sources")]
#[command(
    long_about = "td-sync reconciles the genomic test directory database with the clinically agreed spreadsheet and the PanelApp registry.\n\nIt can:\n- Report differences between the spreadsheet and the database\n- Plan and apply registry panel updates, green genes only by default\n- Build, compare and transcript-check genepanels exports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare the test directory spreadsheet with the database
    ValidateSpreadsheet(validate::ValidateArgs),

    /// Plan registry updates to the database
    Plan(plan::PlanArgs),

    /// Build a genepanels export from the database
    Build(build::BuildArgs),

    /// Compare two genepanels exports
    Compare(compare::CompareArgs),

    /// Check clinical transcript coverage of a genepanels export
    CheckTranscripts(transcripts::CheckTranscriptsArgs),

    /// Check the database for integrity problems
    CheckDb(check_db::CheckDbArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Location of the test directory database
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// Test directory store (JSON)
    #[arg(long, env = "TD_SYNC_STORE")]
    pub store: PathBuf,
}

impl StoreArgs {
    /// Open the store for writing (starting empty if it does not exist) and
    /// load it as a snapshot
    pub(crate) fn open(&self) -> anyhow::Result<(JsonStore, Snapshot)> {
        let store = JsonStore::open(&self.store)
            .with_context(|| format!("Failed to open store {}", self.store.display()))?;
        let snapshot = snapshot_of(&store, &self.store)?;
        Ok((store, snapshot))
    }

    /// Load an existing store as a snapshot
    pub(crate) fn snapshot(&self) -> anyhow::Result<Snapshot> {
        let store = JsonStore::load_from_file(&self.store)
            .with_context(|| format!("Failed to read store {}", self.store.display()))?;
        snapshot_of(&store, &self.store)
    }
}

fn snapshot_of(store: &JsonStore, path: &Path) -> anyhow::Result<Snapshot> {
    load_database(store)
        .with_context(|| format!("Failed to load test directory from {}", path.display()))
}

/// Symbol resolver from an HGNC table, or from the database genes
pub(crate) fn load_resolver(
    files: &LocalFileStore,
    hgnc: Option<&str>,
    current: &Snapshot,
) -> anyhow::Result<GeneResolver> {
    match hgnc {
        Some(file_id) => {
            let records =
                load_hgnc(files, file_id).with_context(|| format!("Failed to read HGNC table {file_id}"))?;
            Ok(GeneResolver::from_hgnc_records(&records))
        }
        None => Ok(GeneResolver::from_genes(&current.genes)),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
