use std::path::Path;

use tracing::debug;

use super::files::FileStore;
use super::tabular::{delimiter_for, read_rows};
use super::ParseError;
use crate::store::Row;

/// Load the test directory spreadsheet export
///
/// The delimiter follows the file name (`.tsv` tab, otherwise comma). Column
/// names are kept as written; the canonicalizer maps them.
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be opened or parsed.
pub fn load_spreadsheet(files: &impl FileStore, file_id: &str) -> Result<Vec<Row>, ParseError> {
    let rows = read_rows(files.open(file_id)?, delimiter_for(Path::new(file_id)))?;
    debug!(file = file_id, rows = rows.len(), "Loaded spreadsheet");
    Ok(rows)
}
