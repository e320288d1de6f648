use serde::{Deserialize, Serialize};

use crate::core::types::{Confidence, HgncId, PanelId, PanelVersion, RecordStatus};

/// A gene as known to the genes table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub hgnc_id: HgncId,

    /// Display symbol; never used as a comparison key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    pub confidence_level: Confidence,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_of_inheritance: Option<String>,
}

impl Gene {
    pub fn new(hgnc_id: HgncId, confidence_level: Confidence) -> Self {
        Self {
            hgnc_id,
            symbol: None,
            confidence_level,
            mode_of_inheritance: None,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_inheritance(mut self, moi: impl Into<String>) -> Self {
        self.mode_of_inheritance = Some(moi.into());
        self
    }
}

/// Membership of a gene in one version of a panel
///
/// A gene appears at most once per `(panel_id, panel_version)`. Superseded
/// links are kept with `status = Retired` rather than deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelGeneLink {
    pub panel_id: PanelId,
    pub panel_version: PanelVersion,
    pub hgnc_id: HgncId,
    pub confidence_level: Confidence,
    #[serde(default)]
    pub status: RecordStatus,
}

impl PanelGeneLink {
    pub fn new(
        panel_id: PanelId,
        panel_version: PanelVersion,
        hgnc_id: HgncId,
        confidence_level: Confidence,
    ) -> Self {
        Self {
            panel_id,
            panel_version,
            hgnc_id,
            confidence_level,
            status: RecordStatus::Current,
        }
    }

    #[must_use]
    pub fn retired(mut self) -> Self {
        self.status = RecordStatus::Retired;
        self
    }

    pub fn is_current(&self) -> bool {
        self.status == RecordStatus::Current
    }
}
