use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::panel::Panel;
use crate::core::types::{HgncId, PanelId, PanelVersion};

/// Fully materialized panel, gene and link state from one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub panels: Vec<Panel>,
    pub genes: Vec<Gene>,
    pub links: Vec<PanelGeneLink>,
}

impl Snapshot {
    pub fn new(panels: Vec<Panel>, genes: Vec<Gene>, links: Vec<PanelGeneLink>) -> Self {
        Self {
            panels,
            genes,
            links,
        }
    }

    /// Highest current version held for `panel_id`
    pub fn current_version(&self, panel_id: &PanelId) -> Option<PanelVersion> {
        self.panels
            .iter()
            .filter(|p| p.is_current() && &p.panel_id == panel_id)
            .map(|p| p.version)
            .max()
    }

    /// The current panel row for `panel_id` (the highest version if the table
    /// holds several current rows)
    pub fn current_panel(&self, panel_id: &PanelId) -> Option<&Panel> {
        self.panels
            .iter()
            .filter(|p| p.is_current() && &p.panel_id == panel_id)
            .max_by_key(|p| p.version)
    }

    /// Current links of `panel_id`, across versions
    pub fn current_links<'a>(
        &'a self,
        panel_id: &'a PanelId,
    ) -> impl Iterator<Item = &'a PanelGeneLink> + 'a {
        self.links
            .iter()
            .filter(move |l| l.is_current() && &l.panel_id == panel_id)
    }

    /// Distinct panel ids present in the panels table, in natural order
    pub fn panel_ids(&self) -> BTreeSet<PanelId> {
        self.panels.iter().map(|p| p.panel_id.clone()).collect()
    }

    /// Genes indexed by HGNC id (first row wins)
    pub fn genes_by_id(&self) -> BTreeMap<HgncId, &Gene> {
        let mut map = BTreeMap::new();
        for gene in &self.genes {
            map.entry(gene.hgnc_id).or_insert(gene);
        }
        map
    }

    /// Append another snapshot's rows
    pub fn extend(&mut self, other: Snapshot) {
        self.panels.extend(other.panels);
        self.genes.extend(other.genes);
        self.links.extend(other.links);
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.genes.is_empty() && self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Confidence, RecordStatus};

    #[test]
    fn test_current_version_ignores_retired_rows() {
        let snapshot = Snapshot::new(
            vec![
                Panel::new("486", "A", PanelVersion::new(1, 0)).with_status(RecordStatus::Retired),
                Panel::new("486", "A", PanelVersion::new(2, 0)),
                Panel::new("486", "A", PanelVersion::new(3, 0)).with_status(RecordStatus::Retired),
            ],
            vec![],
            vec![],
        );
        let id = PanelId::new("486");
        assert_eq!(snapshot.current_version(&id), Some(PanelVersion::new(2, 0)));
        assert_eq!(snapshot.current_version(&PanelId::new("1")), None);
    }

    #[test]
    fn test_current_links_filters_by_panel_and_status() {
        let id = PanelId::new("486");
        let v1 = PanelVersion::new(1, 0);
        let snapshot = Snapshot::new(
            vec![],
            vec![],
            vec![
                PanelGeneLink::new(id.clone(), v1, HgncId::new(1), Confidence::Green),
                PanelGeneLink::new(id.clone(), v1, HgncId::new(2), Confidence::Green).retired(),
                PanelGeneLink::new(PanelId::new("9"), v1, HgncId::new(3), Confidence::Green),
            ],
        );
        let hgnc: Vec<HgncId> = snapshot.current_links(&id).map(|l| l.hgnc_id).collect();
        assert_eq!(hgnc, vec![HgncId::new(1)]);
    }
}
