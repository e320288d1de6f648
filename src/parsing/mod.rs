//! Readers for the files the pipeline consumes.
//!
//! This module provides readers for:
//!
//! - **Test directory spreadsheet**: CSV/TSV export, one row per clinical indication
//! - **Genepanels exports**: both the three-column and the legacy four-column layout
//! - **Gene-to-transcript (g2t) tables**: only clinical transcripts are kept
//! - **HGNC complete set**: symbols, previous symbols and aliases for gene resolution
//!
//! Files are addressed by a file identifier through a [`FileStore`](files::FileStore).
//! The shipped [`LocalFileStore`](files::LocalFileStore) treats the identifier as a
//! path and decompresses `.gz` files transparently.
//!
//! ## Layouts
//!
//! | File | Header | Columns |
//! |------|--------|---------|
//! | spreadsheet | yes | any, matched by name |
//! | genepanels (default) | no | `panel_id`, `panel_name`, `hgnc_id` |
//! | genepanels (legacy) | no | `clinical_indication`, `panel_name_version`, `hgnc_id`, `panel_id` |
//! | g2t | no | `hgnc_id`, `transcript`, `transcript_type`, `canonical` |
//! | HGNC | yes | `hgnc_id`, `symbol`, `prev_symbol`, `alias_symbol` |

use thiserror::Error;

pub mod files;
pub mod g2t;
pub mod genepanels;
pub mod hgnc;
pub mod spreadsheet;
pub mod tabular;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed delimited file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Too many rows: {0} exceeds maximum allowed (1000000)")]
    TooManyRows(usize),
}
