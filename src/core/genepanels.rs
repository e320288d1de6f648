use serde::{Deserialize, Serialize};

use crate::core::types::{HgncId, PanelId};

/// One panel/gene pair of the flat genepanels export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenepanelsRow {
    pub panel_id: PanelId,
    pub panel_name: String,
    pub hgnc_id: HgncId,

    /// `<test id>_<clinical indication>_P`, only present in the legacy layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_indication: Option<String>,
}

impl GenepanelsRow {
    pub fn new(panel_id: PanelId, panel_name: impl Into<String>, hgnc_id: HgncId) -> Self {
        Self {
            panel_id,
            panel_name: panel_name.into(),
            hgnc_id,
            clinical_indication: None,
        }
    }

    #[must_use]
    pub fn with_clinical_indication(mut self, ci: impl Into<String>) -> Self {
        self.clinical_indication = Some(ci.into());
        self
    }
}

/// A gene's clinical transcript from the g2t table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptMapping {
    pub hgnc_id: HgncId,
    pub clinical_transcript_id: String,
}

impl TranscriptMapping {
    pub fn new(hgnc_id: HgncId, transcript: impl Into<String>) -> Self {
        Self {
            hgnc_id,
            clinical_transcript_id: transcript.into(),
        }
    }
}
