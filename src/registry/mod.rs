//! Access to the public panel registry (PanelApp).
//!
//! The planner never talks to the registry directly. A
//! [`RegistrySnapshot`] is gathered once per run with [`fetch_snapshot`] and
//! handed to the canonicalizer, so a plan can be reproduced from a saved
//! snapshot file without network access.
//!
//! Two [`Registry`] implementations ship with the crate:
//!
//! - [`PanelAppClient`](panelapp::PanelAppClient): the live PanelApp REST API
//! - [`SnapshotRegistry`](snapshot::SnapshotRegistry): answers from a saved snapshot

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::types::{PanelId, PanelVersion};

pub mod panelapp;
pub mod snapshot;

/// Default PanelApp API root
pub const DEFAULT_BASE_URL: &str = "https://panelapp.genomicsengland.co.uk/api/v1";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Panel {0} has no signed-off version")]
    NotSignedOff(PanelId),

    #[error("Panel {panel_id} version {version} is not available")]
    VersionUnavailable {
        panel_id: PanelId,
        version: PanelVersion,
    },

    #[error("Unexpected registry payload: {0}")]
    Payload(String),

    #[error("Failed to read registry snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse registry snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connection settings for the live registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Latest signed-off release of a panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOff {
    pub name: String,
    pub version: PanelVersion,
    #[serde(default)]
    pub signed_off: Option<NaiveDate>,
}

/// One gene of a registry panel, as published
///
/// Identifiers are kept raw; the canonicalizer resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryGene {
    #[serde(default)]
    pub hgnc_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub confidence_level: String,
    #[serde(default)]
    pub mode_of_inheritance: Option<String>,
}

/// A registry panel at one specific version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDefinition {
    pub id: PanelId,
    pub name: String,
    pub version: PanelVersion,
    #[serde(default)]
    pub signed_off: Option<NaiveDate>,
    pub genes: Vec<RegistryGene>,
}

/// Source of authoritative panel content
#[allow(async_fn_in_trait)]
pub trait Registry {
    /// Latest signed-off version of `panel_id`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotSignedOff` if the panel was never signed
    /// off, or a transport error.
    async fn get_signed_off_version(&self, panel_id: &PanelId) -> Result<SignedOff, RegistryError>;

    /// Full gene content of `panel_id` at `version`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::VersionUnavailable` if the version is unknown,
    /// or a transport error.
    async fn get_panel(
        &self,
        panel_id: &PanelId,
        version: PanelVersion,
    ) -> Result<PanelDefinition, RegistryError>;
}

/// A panel that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub panel_id: PanelId,
    pub error: String,
}

/// Registry content gathered for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// RFC 3339 timestamp of the fetch
    pub fetched_at: String,
    pub definitions: Vec<PanelDefinition>,
    #[serde(default)]
    pub failures: Vec<FetchFailure>,
}

impl RegistrySnapshot {
    /// Load a snapshot previously written with [`RegistrySnapshot::save`]
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` or `RegistryError::Json` on failure.
    pub fn load(path: &std::path::Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the snapshot as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` or `RegistryError::Json` on failure.
    pub fn save(&self, path: &std::path::Path) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Fetch the latest signed-off content of every panel in `panel_ids`
///
/// Panels are fetched one after another. A panel that fails is recorded in
/// `failures` and left out; it will simply not be planned this run.
pub async fn fetch_snapshot(registry: &impl Registry, panel_ids: &[PanelId]) -> RegistrySnapshot {
    let mut snapshot = RegistrySnapshot {
        fetched_at: chrono::Utc::now().to_rfc3339(),
        ..RegistrySnapshot::default()
    };

    for panel_id in panel_ids {
        let result = async {
            let signed_off = registry.get_signed_off_version(panel_id).await?;
            let mut definition = registry.get_panel(panel_id, signed_off.version).await?;
            if definition.signed_off.is_none() {
                definition.signed_off = signed_off.signed_off;
            }
            Ok::<_, RegistryError>(definition)
        }
        .await;

        match result {
            Ok(definition) => {
                info!(
                    panel_id = %panel_id,
                    version = %definition.version,
                    genes = definition.genes.len(),
                    "Fetched registry panel"
                );
                snapshot.definitions.push(definition);
            }
            Err(e) => {
                warn!(panel_id = %panel_id, error = %e, "Failed to fetch registry panel");
                snapshot.failures.push(FetchFailure {
                    panel_id: panel_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    snapshot
}
