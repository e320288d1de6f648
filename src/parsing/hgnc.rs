use std::io::Read;

use tracing::{debug, warn};

use super::files::FileStore;
use super::tabular::read_rows;
use super::ParseError;
use crate::core::types::HgncId;
use crate::utils::validation::normalize_column_name;

/// One gene of the HGNC complete set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HgncRecord {
    pub hgnc_id: HgncId,
    pub symbol: String,
    pub previous_symbols: Vec<String>,
    pub alias_symbols: Vec<String>,
}

/// Load an HGNC complete-set TSV by file identifier
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be read or lacks the
/// `hgnc_id`/`symbol` columns.
pub fn load_hgnc(files: &impl FileStore, file_id: &str) -> Result<Vec<HgncRecord>, ParseError> {
    parse_hgnc(files.open(file_id)?)
}

/// Parse an HGNC complete-set TSV
///
/// Multi-valued columns use `|` separators and may be wrapped in quotes.
/// Rows with an unparseable id are skipped with a warning.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the `hgnc_id` or `symbol` column is
/// missing.
pub fn parse_hgnc<R: Read>(reader: R) -> Result<Vec<HgncRecord>, ParseError> {
    let rows = read_rows(reader, b'\t')?;
    let column = |row: &crate::store::Row, name: &str| -> Option<String> {
        row.iter()
            .find(|(header, _)| normalize_column_name(header) == name)
            .map(|(_, value)| value.clone())
    };

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let (Some(raw_id), Some(symbol)) = (column(row, "hgnc_id"), column(row, "symbol")) else {
            return Err(ParseError::InvalidFormat(format!(
                "HGNC row {} lacks hgnc_id or symbol",
                index + 1
            )));
        };
        let Ok(hgnc_id) = raw_id.parse::<HgncId>() else {
            warn!(row = index + 1, value = %raw_id, "Skipping HGNC row with invalid id");
            continue;
        };
        records.push(HgncRecord {
            hgnc_id,
            symbol,
            previous_symbols: split_symbols(column(row, "prev_symbol").as_deref()),
            alias_symbols: split_symbols(column(row, "alias_symbol").as_deref()),
        });
    }

    debug!(records = records.len(), "Parsed HGNC table");
    Ok(records)
}

fn split_symbols(cell: Option<&str>) -> Vec<String> {
    cell.unwrap_or_default()
        .trim_matches('"')
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hgnc_complete_set() {
        let text = "hgnc_id\tsymbol\tname\tprev_symbol\talias_symbol\n\
                    HGNC:5\tA1BG\talpha-1-B glycoprotein\t\t\n\
                    HGNC:6294\tKCNQ1\tpotassium channel\tKCNA8|LQT1\tKVLQT1|Kv7.1\n\
                    withdrawn\tXYZ\t\t\t\n";
        let records = parse_hgnc(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].previous_symbols.is_empty());
        assert_eq!(records[1].previous_symbols, vec!["KCNA8", "LQT1"]);
        assert_eq!(records[1].alias_symbols, vec!["KVLQT1", "Kv7.1"]);
    }

    #[test]
    fn test_missing_symbol_column() {
        let text = "hgnc_id\tname\nHGNC:5\tx\n";
        assert!(matches!(
            parse_hgnc(text.as_bytes()),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
