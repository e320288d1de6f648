//! Consistency checks over a loaded test directory.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::warn;

use crate::core::snapshot::Snapshot;
use crate::core::types::{HgncId, PanelId, PanelVersion};

/// Problems found in the test directory tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Current panels without a current link at their version
    pub panels_without_genes: Vec<(PanelId, PanelVersion)>,
    /// Genes linked more than once to a panel among current links
    pub duplicate_links: Vec<(PanelId, HgncId)>,
    /// Panels with more than one current row, with those versions
    pub multiple_current: Vec<(PanelId, Vec<PanelVersion>)>,
    /// Links whose panel version has no panel row
    pub orphan_links: Vec<(PanelId, PanelVersion, HgncId)>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.panels_without_genes.len()
            + self.duplicate_links.len()
            + self.multiple_current.len()
            + self.orphan_links.len()
    }
}

/// Run every check against `snapshot`
pub fn check(snapshot: &Snapshot) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    let panel_rows: BTreeSet<(&PanelId, PanelVersion)> = snapshot
        .panels
        .iter()
        .map(|p| (&p.panel_id, p.version))
        .collect();

    let mut current_versions: BTreeMap<&PanelId, Vec<PanelVersion>> = BTreeMap::new();
    for panel in snapshot.panels.iter().filter(|p| p.is_current()) {
        current_versions.entry(&panel.panel_id).or_default().push(panel.version);
    }

    let mut linked: BTreeSet<(&PanelId, PanelVersion)> = BTreeSet::new();
    let mut link_counts: BTreeMap<(&PanelId, HgncId), usize> = BTreeMap::new();
    for link in snapshot.links.iter().filter(|l| l.is_current()) {
        linked.insert((&link.panel_id, link.panel_version));
        *link_counts.entry((&link.panel_id, link.hgnc_id)).or_default() += 1;
    }

    for (panel_id, versions) in &current_versions {
        for &version in versions {
            if !linked.contains(&(*panel_id, version)) {
                report.panels_without_genes.push(((*panel_id).clone(), version));
            }
        }
        if versions.len() > 1 {
            let mut versions = versions.clone();
            versions.sort();
            report.multiple_current.push(((*panel_id).clone(), versions));
        }
    }

    report.duplicate_links = link_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((panel_id, hgnc_id), _)| (panel_id.clone(), hgnc_id))
        .collect();

    let mut orphans: Vec<(PanelId, PanelVersion, HgncId)> = snapshot
        .links
        .iter()
        .filter(|l| !panel_rows.contains(&(&l.panel_id, l.panel_version)))
        .map(|l| (l.panel_id.clone(), l.panel_version, l.hgnc_id))
        .collect();
    orphans.sort();
    orphans.dedup();
    report.orphan_links = orphans;

    if !report.is_clean() {
        warn!(issues = report.issue_count(), "Test directory integrity issues found");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gene::PanelGeneLink;
    use crate::core::panel::Panel;
    use crate::core::types::{Confidence, RecordStatus};

    fn v(major: u32) -> PanelVersion {
        PanelVersion::new(major, 0)
    }

    fn link(panel: &str, version: u32, hgnc: u32) -> PanelGeneLink {
        PanelGeneLink::new(PanelId::new(panel), v(version), HgncId::new(hgnc), Confidence::Green)
    }

    #[test]
    fn test_clean_directory() {
        let snapshot = Snapshot::new(
            vec![
                Panel::new("1", "One", v(1)).with_status(RecordStatus::Retired),
                Panel::new("1", "One", v(2)),
            ],
            vec![],
            vec![link("1", 1, 5).retired(), link("1", 2, 5)],
        );
        let report = check(&snapshot);
        assert!(report.is_clean(), "{report:?}");
    }

    #[test]
    fn test_every_issue_kind() {
        let snapshot = Snapshot::new(
            vec![
                Panel::new("1", "One", v(1)),
                Panel::new("1", "One", v(2)),
                Panel::new("R5", "Empty", v(1)),
            ],
            vec![],
            vec![
                link("1", 1, 5),
                link("1", 2, 5),
                link("1", 2, 6),
                link("9", 3, 7),
            ],
        );
        let report = check(&snapshot);

        assert_eq!(report.panels_without_genes, vec![(PanelId::new("R5"), v(1))]);
        assert_eq!(report.duplicate_links, vec![(PanelId::new("1"), HgncId::new(5))]);
        assert_eq!(report.multiple_current, vec![(PanelId::new("1"), vec![v(1), v(2)])]);
        assert_eq!(report.orphan_links, vec![(PanelId::new("9"), v(3), HgncId::new(7))]);
        assert_eq!(report.issue_count(), 4);
    }
}
