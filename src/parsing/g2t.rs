use std::io::Read;

use tracing::debug;

use super::files::FileStore;
use super::tabular::read_headerless_tsv;
use super::ParseError;
use crate::core::genepanels::TranscriptMapping;
use crate::core::types::HgncId;

/// `transcript_type` value marking the clinical transcript of a gene
pub const CLINICAL_TRANSCRIPT: &str = "clinical_transcript";

/// Read the clinical transcript mappings of a g2t table
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be read or parsed.
pub fn read_g2t(files: &impl FileStore, file_id: &str) -> Result<Vec<TranscriptMapping>, ParseError> {
    parse_g2t(files.open(file_id)?)
}

/// Parse a g2t table (`hgnc_id`, `transcript`, `transcript_type`, `canonical`)
///
/// Rows of any other transcript type are ignored.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for a clinical row with fewer than
/// three columns or an invalid HGNC id.
pub fn parse_g2t<R: Read>(reader: R) -> Result<Vec<TranscriptMapping>, ParseError> {
    let records = read_headerless_tsv(reader)?;
    let mut mappings = Vec::new();
    let mut ignored = 0usize;

    for (line, record) in &records {
        if record.get(2) != Some(CLINICAL_TRANSCRIPT) {
            ignored += 1;
            continue;
        }
        let hgnc_id: HgncId = record
            .get(0)
            .unwrap_or_default()
            .parse()
            .map_err(|e| ParseError::InvalidFormat(format!("Line {line}: {e}")))?;
        let transcript = record.get(1).unwrap_or_default();
        if transcript.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line}: clinical transcript without a transcript id"
            )));
        }
        mappings.push(TranscriptMapping::new(hgnc_id, transcript));
    }

    debug!(mappings = mappings.len(), ignored, "Parsed g2t table");
    Ok(mappings)
}
