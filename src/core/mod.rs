//! Core data types for the test directory.
//!
//! - [`Panel`](panel::Panel): one version of a clinical panel
//! - [`Gene`](gene::Gene) and [`PanelGeneLink`](gene::PanelGeneLink): genes and their
//!   membership in a panel version
//! - [`GenepanelsRow`](genepanels::GenepanelsRow): the unit of the flat export
//! - [`TranscriptMapping`](genepanels::TranscriptMapping): gene to clinical transcript
//! - [`Snapshot`](snapshot::Snapshot): materialized panels, genes and links from one source
//! - [`HgncId`], [`PanelId`], [`PanelVersion`], [`Confidence`]: identifiers and
//!   ordered vocabularies
//!
//! ## Identifiers
//!
//! Genes are always compared on their HGNC id. Symbols are carried for display
//! only, since the same gene can appear under a previous symbol in one source
//! and its current symbol in another.
//!
//! | Source | Gene identifier | Confidence |
//! |--------|-----------------|------------|
//! | Database | `HGNC:1100` | `green` |
//! | Spreadsheet | `BRCA1` or `HGNC:1100` | implied green |
//! | PanelApp | `HGNC:1100` | `"3"` |
//!
//! [`HgncId`]: types::HgncId
//! [`PanelId`]: types::PanelId
//! [`PanelVersion`]: types::PanelVersion
//! [`Confidence`]: types::Confidence

pub mod gene;
pub mod genepanels;
pub mod panel;
pub mod snapshot;
pub mod types;
