use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use super::Layout;
use crate::core::gene::PanelGeneLink;
use crate::core::genepanels::GenepanelsRow;
use crate::core::panel::Panel;
use crate::core::types::{HgncId, PanelId, PanelVersion};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Panel {panel_id} version {version} is current but has no current genes")]
    IncompletePanel {
        panel_id: PanelId,
        version: PanelVersion,
    },

    #[error("Panel {panel_id} has {} current versions: {versions:?}", .versions.len())]
    ConflictingCurrentVersions {
        panel_id: PanelId,
        versions: Vec<PanelVersion>,
    },
}

/// Build the genepanels rows for the default layout
///
/// # Errors
///
/// See [`build_with_layout`].
pub fn build(panels: &[Panel], links: &[PanelGeneLink]) -> Result<Vec<GenepanelsRow>, BuildError> {
    build_with_layout(panels, links, Layout::Default)
}

/// Join current panels with the current links of their current version
///
/// Rows are sorted by panel id, then HGNC id, so identical input always
/// renders to identical bytes. The legacy layout labels panels with their
/// versioned name and carries the clinical indication.
///
/// # Errors
///
/// Returns `BuildError::ConflictingCurrentVersions` if a panel id has more
/// than one current row, or `BuildError::IncompletePanel` if a current panel
/// has no current links. Either error fails the whole build.
pub fn build_with_layout(
    panels: &[Panel],
    links: &[PanelGeneLink],
    layout: Layout,
) -> Result<Vec<GenepanelsRow>, BuildError> {
    let mut current: BTreeMap<&PanelId, Vec<&Panel>> = BTreeMap::new();
    for panel in panels.iter().filter(|p| p.is_current()) {
        current.entry(&panel.panel_id).or_default().push(panel);
    }

    let mut genes: BTreeMap<(&PanelId, PanelVersion), BTreeSet<HgncId>> = BTreeMap::new();
    for link in links.iter().filter(|l| l.is_current()) {
        genes
            .entry((&link.panel_id, link.panel_version))
            .or_default()
            .insert(link.hgnc_id);
    }

    let mut rows = Vec::new();
    for (panel_id, versions) in current {
        let [panel] = versions.as_slice() else {
            let mut versions: Vec<PanelVersion> = versions.iter().map(|p| p.version).collect();
            versions.sort();
            return Err(BuildError::ConflictingCurrentVersions {
                panel_id: panel_id.clone(),
                versions,
            });
        };

        let hgnc_ids = genes
            .get(&(panel_id, panel.version))
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| BuildError::IncompletePanel {
                panel_id: panel_id.clone(),
                version: panel.version,
            })?;

        let (name, indication) = match layout {
            Layout::Default => (panel.name.clone(), None),
            Layout::Legacy => (
                panel.versioned_name(),
                Some(clinical_indication_label(panel)),
            ),
        };
        for &hgnc_id in hgnc_ids {
            let mut row = GenepanelsRow::new(panel_id.clone(), name.clone(), hgnc_id);
            row.clinical_indication = indication.clone();
            rows.push(row);
        }
    }

    debug!(rows = rows.len(), "Built genepanels rows");
    Ok(rows)
}

/// `<indication>_<panel name>_P`, falling back to the panel id
fn clinical_indication_label(panel: &Panel) -> String {
    let code = panel
        .clinical_indication_code
        .as_deref()
        .unwrap_or(panel.panel_id.as_str());
    format!("{code}_{}_P", panel.name)
}
