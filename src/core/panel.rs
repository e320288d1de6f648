use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::types::{PanelId, PanelSource, PanelVersion, RecordStatus};

/// One version of a panel as held in the test directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    /// Stable panel identifier
    pub panel_id: PanelId,

    /// Panel name as published (or as agreed locally)
    pub name: String,

    /// Source-assigned version, strictly increasing per panel
    pub version: PanelVersion,

    /// Clinical indication code, e.g. `R134`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_indication_code: Option<String>,

    /// Date the registry signed this version off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signoff_date: Option<NaiveDate>,

    pub source: PanelSource,

    #[serde(default)]
    pub status: RecordStatus,
}

impl Panel {
    pub fn new(panel_id: impl Into<String>, name: impl Into<String>, version: PanelVersion) -> Self {
        let panel_id = PanelId::new(panel_id);
        let source = if panel_id.is_numeric() {
            PanelSource::PanelApp
        } else {
            PanelSource::Local
        };
        Self {
            panel_id,
            name: name.into(),
            version,
            clinical_indication_code: None,
            signoff_date: None,
            source,
            status: RecordStatus::Current,
        }
    }

    #[must_use]
    pub fn with_indication(mut self, code: impl Into<String>) -> Self {
        self.clinical_indication_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_signoff_date(mut self, date: NaiveDate) -> Self {
        self.signoff_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: PanelSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_current(&self) -> bool {
        self.status == RecordStatus::Current
    }

    /// `name_version`, the panel label used by the legacy genepanels layout
    pub fn versioned_name(&self) -> String {
        format!("{}_{}", self.name, self.version)
    }
}
