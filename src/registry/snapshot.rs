use std::collections::BTreeMap;

use super::{PanelDefinition, Registry, RegistryError, RegistrySnapshot, SignedOff};
use crate::core::types::{PanelId, PanelVersion};

/// A registry answering from previously fetched panel definitions
///
/// The highest version held for a panel is treated as its latest signed-off
/// release.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRegistry {
    panels: BTreeMap<PanelId, BTreeMap<PanelVersion, PanelDefinition>>,
}

impl SnapshotRegistry {
    pub fn new(definitions: Vec<PanelDefinition>) -> Self {
        let mut panels: BTreeMap<PanelId, BTreeMap<PanelVersion, PanelDefinition>> =
            BTreeMap::new();
        for definition in definitions {
            panels
                .entry(definition.id.clone())
                .or_default()
                .insert(definition.version, definition);
        }
        Self { panels }
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self::new(snapshot.definitions)
    }
}

impl Registry for SnapshotRegistry {
    async fn get_signed_off_version(&self, panel_id: &PanelId) -> Result<SignedOff, RegistryError> {
        self.panels
            .get(panel_id)
            .and_then(|versions| versions.values().next_back())
            .map(|latest| SignedOff {
                name: latest.name.clone(),
                version: latest.version,
                signed_off: latest.signed_off,
            })
            .ok_or_else(|| RegistryError::NotSignedOff(panel_id.clone()))
    }

    async fn get_panel(
        &self,
        panel_id: &PanelId,
        version: PanelVersion,
    ) -> Result<PanelDefinition, RegistryError> {
        self.panels
            .get(panel_id)
            .and_then(|versions| versions.get(&version))
            .cloned()
            .ok_or_else(|| RegistryError::VersionUnavailable {
                panel_id: panel_id.clone(),
                version,
            })
    }
}
