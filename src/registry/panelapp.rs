//! PanelApp REST client.
//!
//! Endpoints used:
//!
//! - `GET {base}/panels/signedoff/?panel_id={id}`: signed-off releases,
//!   newest first
//! - `GET {base}/panels/{id}/?version={version}`: panel content at a version

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{PanelDefinition, Registry, RegistryConfig, RegistryError, RegistryGene, SignedOff};
use crate::core::types::{parse_date, PanelId, PanelVersion};

/// Live PanelApp API client
#[derive(Debug, Clone)]
pub struct PanelAppClient {
    http: Client,
    base_url: String,
}

impl PanelAppClient {
    /// Create a client for the API described by `config`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Http` if the HTTP client cannot be built.
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RegistryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Registry request");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct SignedOffPage {
    #[serde(default)]
    results: Vec<SignedOffEntry>,
}

#[derive(Debug, Deserialize)]
struct SignedOffEntry {
    name: String,
    version: String,
    #[serde(default)]
    signed_off: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PanelPayload {
    name: String,
    version: String,
    #[serde(default)]
    genes: Vec<GenePayload>,
}

#[derive(Debug, Deserialize)]
struct GenePayload {
    #[serde(default)]
    gene_data: Option<GeneData>,
    #[serde(default)]
    confidence_level: Option<String>,
    #[serde(default)]
    mode_of_inheritance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneData {
    #[serde(default)]
    hgnc_id: Option<String>,
    #[serde(default)]
    gene_symbol: Option<String>,
}

fn parse_version(panel_id: &PanelId, raw: &str) -> Result<PanelVersion, RegistryError> {
    raw.parse()
        .map_err(|e| RegistryError::Payload(format!("panel {panel_id}: {e}")))
}

impl PanelPayload {
    fn into_definition(self, panel_id: &PanelId) -> Result<PanelDefinition, RegistryError> {
        let genes = self
            .genes
            .into_iter()
            .filter_map(|gene| {
                let data = gene.gene_data?;
                Some(RegistryGene {
                    hgnc_id: data.hgnc_id,
                    symbol: data.gene_symbol,
                    confidence_level: gene.confidence_level.unwrap_or_default(),
                    mode_of_inheritance: gene.mode_of_inheritance.filter(|m| !m.trim().is_empty()),
                })
            })
            .collect();
        Ok(PanelDefinition {
            id: panel_id.clone(),
            version: parse_version(panel_id, &self.version)?,
            name: self.name,
            signed_off: None,
            genes,
        })
    }
}

impl Registry for PanelAppClient {
    async fn get_signed_off_version(&self, panel_id: &PanelId) -> Result<SignedOff, RegistryError> {
        let page: SignedOffPage = self
            .get(&format!("/panels/signedoff/?panel_id={panel_id}"))
            .await?;
        let latest = page
            .results
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::NotSignedOff(panel_id.clone()))?;

        Ok(SignedOff {
            version: parse_version(panel_id, &latest.version)?,
            name: latest.name,
            signed_off: latest.signed_off.as_deref().and_then(|d| parse_date(d).ok()),
        })
    }

    async fn get_panel(
        &self,
        panel_id: &PanelId,
        version: PanelVersion,
    ) -> Result<PanelDefinition, RegistryError> {
        let payload: PanelPayload = match self
            .get(&format!("/panels/{panel_id}/?version={version}"))
            .await
        {
            Err(RegistryError::Status { status: 404, .. }) => {
                return Err(RegistryError::VersionUnavailable {
                    panel_id: panel_id.clone(),
                    version,
                })
            }
            other => other?,
        };
        payload.into_definition(panel_id)
    }
}
