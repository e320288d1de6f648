//! # td-sync
//!
//! A library for keeping a genomic test directory consistent with its sources.
//!
//! The test directory database says which genes are tested for each clinical
//! indication. Three sources have to agree with it: the clinically agreed
//! test directory spreadsheet, the PanelApp registry of gene panels, and the
//! flat "genepanels" file that downstream pipelines consume.
//!
//! `td-sync` reads every source into the same canonical model, keyed by
//! panel id and HGNC id, and then:
//!
//! ## Features
//!
//! - **Spreadsheet validation**: field-level differences between the spreadsheet and the database
//! - **Registry updates**: version-guarded, green-only panel updates with a dry-run preview
//! - **Genepanels export**: deterministic export with an MD5 digest, in two layouts
//! - **Export comparison**: panel-level and row-level differences between two exports
//! - **Transcript gate**: an export is only promotable when every gene has a clinical transcript
//!
//! ## Example
//!
//! ```rust,no_run
//! use td_sync::canonical::load_database;
//! use td_sync::genepanels::build;
//! use td_sync::store::json::JsonStore;
//!
//! let store = JsonStore::load_from_file(std::path::Path::new("td.json")).unwrap();
//! let current = load_database(&store).unwrap();
//!
//! for row in build(&current.panels, &current.links).unwrap() {
//!     println!("{}\t{}\t{}", row.panel_id, row.panel_name, row.hgnc_id);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Panels, genes, links and the identifier types
//! - [`canonical`]: Source rows and registry payloads into canonical entities
//! - [`diff`]: Keyed, field-level comparison of entity sets
//! - [`planner`]: Registry snapshot into database operations
//! - [`genepanels`]: Building and comparing genepanels exports
//! - [`transcripts`]: Clinical transcript coverage of an export
//! - [`registry`]: PanelApp client and offline snapshots
//! - [`store`]: Test directory tables
//! - [`parsing`]: Readers for spreadsheets, exports, g2t and HGNC files
//! - [`cli`]: Command-line interface implementation

pub mod canonical;
pub mod cli;
pub mod core;
pub mod diff;
pub mod genepanels;
pub mod parsing;
pub mod planner;
pub mod registry;
pub mod store;
pub mod transcripts;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::gene::{Gene, PanelGeneLink};
pub use core::panel::Panel;
pub use core::snapshot::Snapshot;
pub use core::types::*;
pub use planner::{apply, plan, ChangeSet};
