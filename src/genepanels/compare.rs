use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::genepanels::GenepanelsRow;
use crate::core::types::{HgncId, PanelId};
use crate::diff::{compare, keys, Comparison};

/// Differences between a previous (left) and a new (right) export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportComparison {
    /// One record per panel added, removed or relabelled
    pub panels: Comparison<PanelId>,
    /// One record per panel/gene pair added, removed or relabelled
    pub rows: Comparison<(PanelId, HgncId)>,
}

impl ExportComparison {
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.rows.is_empty()
    }
}

/// Compare two genepanels exports at panel level and at row level
pub fn compare_exports(previous: &[GenepanelsRow], new: &[GenepanelsRow]) -> ExportComparison {
    ExportComparison {
        panels: compare(
            &first_row_per_panel(previous),
            &first_row_per_panel(new),
            keys::genepanels_panel,
        ),
        rows: compare(previous, new, keys::genepanels_row),
    }
}

fn first_row_per_panel(rows: &[GenepanelsRow]) -> Vec<GenepanelsRow> {
    let mut seen = BTreeSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.panel_id.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffCategory;

    fn row(panel: &str, name: &str, hgnc: u32) -> GenepanelsRow {
        GenepanelsRow::new(PanelId::new(panel), name, HgncId::new(hgnc))
    }

    #[test]
    fn test_gene_swap_within_panel() {
        let previous = vec![row("P1", "Panel", 1)];
        let new = vec![row("P1", "Panel", 2)];

        let comparison = compare_exports(&previous, &new);
        assert!(comparison.panels.is_empty());

        let flat: Vec<(u32, DiffCategory)> = comparison
            .rows
            .records
            .iter()
            .map(|r| (r.key.1.number(), r.category))
            .collect();
        assert_eq!(
            flat,
            vec![(1, DiffCategory::MissingRight), (2, DiffCategory::MissingLeft)]
        );
    }

    #[test]
    fn test_panel_level_changes() {
        let previous = vec![row("9", "Nine", 1), row("9", "Nine", 2), row("10", "Ten", 1)];
        let new = vec![row("10", "Ten v2", 1), row("11", "Eleven", 3)];

        let comparison = compare_exports(&previous, &new);
        assert_eq!(comparison.panels.summary.missing_right, 1);
        assert_eq!(comparison.panels.summary.missing_left, 1);
        assert_eq!(comparison.panels.summary.value_mismatch, 1);
        assert_eq!(comparison.panels.summary.duplicate_keys, 0);
        assert!(!comparison.is_empty());
    }

    #[test]
    fn test_identical_exports() {
        let rows = vec![row("9", "Nine", 1), row("9", "Nine", 2)];
        assert!(compare_exports(&rows, &rows).is_empty());
    }
}
