//! Shared delimited-text reading on top of the `csv` crate.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::ParseError;
use crate::store::Row;
use crate::utils::validation::check_row_limit;

/// Field delimiter implied by a file name: tab for `.tsv`/`.txt`, comma otherwise
#[must_use]
pub fn delimiter_for(path: &Path) -> u8 {
    let name = path.to_string_lossy().to_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".tsv") || name.ends_with(".txt") {
        b'\t'
    } else {
        b','
    }
}

/// Read a file with a header row into column-name keyed rows
///
/// Blank lines are skipped and every value is trimmed. Rows shorter than the
/// header simply lack the missing columns.
///
/// # Errors
///
/// Returns `ParseError::Csv` for malformed input, `ParseError::InvalidFormat`
/// for an empty header, or `ParseError::TooManyRows` past the row limit.
pub fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Row>, ParseError> {
    let mut csv = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ParseError::InvalidFormat("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if check_row_limit(rows.len()).is_some() {
            return Err(ParseError::TooManyRows(rows.len()));
        }
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

/// Read a headerless tab-delimited file into raw records
///
/// Lines starting with `#` are comments. Quotes carry no meaning.
///
/// # Errors
///
/// Returns `ParseError::Csv` for malformed input or `ParseError::TooManyRows`
/// past the row limit.
pub fn read_headerless_tsv<R: Read>(reader: R) -> Result<Vec<(usize, StringRecord)>, ParseError> {
    let mut csv = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in csv.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if check_row_limit(records.len()).is_some() {
            return Err(ParseError::TooManyRows(records.len()));
        }
        let line = record.position().map_or(records.len() + 1, |p| p.line() as usize);
        records.push((line, record));
    }
    Ok(records)
}
