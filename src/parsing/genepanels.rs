use std::io::Read;

use super::files::FileStore;
use super::tabular::read_headerless_tsv;
use super::ParseError;
use crate::core::genepanels::GenepanelsRow;
use crate::core::types::{HgncId, PanelId};
use crate::genepanels::Layout;

/// Read a genepanels export by file identifier
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be read or is not a genepanels
/// export.
pub fn read_genepanels(
    files: &impl FileStore,
    file_id: &str,
) -> Result<Vec<GenepanelsRow>, ParseError> {
    parse_genepanels(files.open(file_id)?).map(|(_, rows)| rows)
}

/// Parse a genepanels export, detecting its layout from the column count
///
/// An optional header line (starting `panel_id` or `clinical_indication`) is
/// skipped.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for rows with the wrong number of
/// columns or an invalid HGNC id.
pub fn parse_genepanels<R: Read>(reader: R) -> Result<(Layout, Vec<GenepanelsRow>), ParseError> {
    let mut records = read_headerless_tsv(reader)?;
    if let Some((_, first)) = records.first() {
        let label = first.get(0).unwrap_or_default().to_lowercase();
        if label == "panel_id" || label == "clinical_indication" {
            records.remove(0);
        }
    }

    let layout = match records.first().map(|(_, r)| r.len()) {
        Some(4) => Layout::Legacy,
        _ => Layout::Default,
    };
    let width = layout.columns().len();

    let mut rows = Vec::with_capacity(records.len());
    for (line, record) in &records {
        if record.len() != width {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line} has {} columns, expected {width}",
                record.len()
            )));
        }
        let field = |i: usize| record.get(i).unwrap_or_default();
        let hgnc = |raw: &str| {
            raw.parse::<HgncId>()
                .map_err(|e| ParseError::InvalidFormat(format!("Line {line}: {e}")))
        };

        let row = match layout {
            Layout::Default => GenepanelsRow::new(PanelId::new(field(0)), field(1), hgnc(field(2))?),
            Layout::Legacy => {
                let row = GenepanelsRow::new(PanelId::new(field(3)), field(1), hgnc(field(2))?);
                match field(0) {
                    "" => row,
                    indication => row.with_clinical_indication(indication),
                }
            }
        };
        rows.push(row);
    }
    Ok((layout, rows))
}
