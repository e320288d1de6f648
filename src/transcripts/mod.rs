//! Transcript coverage of a genepanels export.
//!
//! Every gene in an export must have a clinical transcript in the g2t table
//! before the export can be promoted.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::genepanels::{GenepanelsRow, TranscriptMapping};
use crate::core::types::HgncId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("{} gene(s) have no clinical transcript: {}", .missing.len(), format_ids(.missing))]
    MissingTranscripts { missing: Vec<HgncId> },
}

fn format_ids(ids: &[HgncId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coverage of an export's genes by clinical transcripts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Distinct genes with at least one clinical transcript
    pub covered: usize,
    /// Genes without one, sorted
    pub missing: Vec<HgncId>,
}

impl ValidationReport {
    pub fn is_promotable(&self) -> bool {
        self.missing.is_empty()
    }

    /// Gate promotion of the export on full coverage
    ///
    /// # Errors
    ///
    /// Returns `TranscriptError::MissingTranscripts` if any gene is missing.
    pub fn ensure_promotable(&self) -> Result<(), TranscriptError> {
        if self.is_promotable() {
            Ok(())
        } else {
            Err(TranscriptError::MissingTranscripts {
                missing: self.missing.clone(),
            })
        }
    }
}

/// Check every distinct gene of `rows` against `mappings`
pub fn validate(rows: &[GenepanelsRow], mappings: &[TranscriptMapping]) -> ValidationReport {
    let mapped: BTreeSet<HgncId> = mappings.iter().map(|m| m.hgnc_id).collect();
    let genes: BTreeSet<HgncId> = rows.iter().map(|r| r.hgnc_id).collect();

    let (covered, missing): (Vec<HgncId>, Vec<HgncId>) =
        genes.into_iter().partition(|id| mapped.contains(id));

    for id in &missing {
        warn!(hgnc_id = %id, "Gene has no clinical transcript");
    }
    info!(
        covered = covered.len(),
        missing = missing.len(),
        "Checked transcript coverage"
    );

    ValidationReport {
        covered: covered.len(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PanelId;

    fn row(panel: &str, hgnc: u32) -> GenepanelsRow {
        GenepanelsRow::new(PanelId::new(panel), "Panel", HgncId::new(hgnc))
    }

    #[test]
    fn test_missing_gene_blocks_promotion() {
        let rows = vec![row("1", 5), row("1", 9), row("2", 5)];
        let mappings = vec![TranscriptMapping::new(HgncId::new(5), "NM_000001.1")];

        let report = validate(&rows, &mappings);
        assert_eq!(report.covered, 1);
        assert_eq!(report.missing, vec![HgncId::new(9)]);
        assert_eq!(
            report.ensure_promotable(),
            Err(TranscriptError::MissingTranscripts {
                missing: vec![HgncId::new(9)]
            })
        );
    }

    #[test]
    fn test_missing_is_sorted_and_distinct() {
        let rows = vec![row("1", 30), row("2", 4), row("3", 30), row("3", 12)];
        let report = validate(&rows, &[]);
        assert_eq!(
            report.missing,
            vec![HgncId::new(4), HgncId::new(12), HgncId::new(30)]
        );
        let message = report.ensure_promotable().unwrap_err().to_string();
        assert!(message.contains("HGNC:12"));
    }

    #[test]
    fn test_full_coverage_is_promotable() {
        let rows = vec![row("1", 5)];
        let mappings = vec![
            TranscriptMapping::new(HgncId::new(5), "NM_000001.1"),
            TranscriptMapping::new(HgncId::new(5), "NM_000001.2"),
        ];
        let report = validate(&rows, &mappings);
        assert!(report.ensure_promotable().is_ok());
        assert_eq!(report.covered, 1);
        assert!(validate(&[], &mappings).is_promotable());
    }
}
