//! Standard key functions.

use super::tracked::IndicationView;
use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::genepanels::GenepanelsRow;
use crate::core::panel::Panel;
use crate::core::types::{HgncId, PanelId};

pub fn panel(panel: &Panel) -> PanelId {
    panel.panel_id.clone()
}

pub fn indication(view: &IndicationView<'_>) -> PanelId {
    view.panel.panel_id.clone()
}

pub fn gene(gene: &Gene) -> HgncId {
    gene.hgnc_id
}

/// `(panel_id, hgnc_id)`, ignoring the panel version
pub fn panel_gene(link: &PanelGeneLink) -> (PanelId, HgncId) {
    (link.panel_id.clone(), link.hgnc_id)
}

pub fn genepanels_row(row: &GenepanelsRow) -> (PanelId, HgncId) {
    (row.panel_id.clone(), row.hgnc_id)
}

/// Panel-level key for genepanels rows; use on one row per panel
pub fn genepanels_panel(row: &GenepanelsRow) -> PanelId {
    row.panel_id.clone()
}
