use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::panel::Panel;
use crate::core::snapshot::Snapshot;
use crate::core::types::{Confidence, HgncId, PanelId, PanelVersion, RecordStatus};
use crate::store::rows::{gene_row, link_row, panel_row};
use crate::store::{Row, Table};

/// Why a link is written or retired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Gene is new to the panel
    Added,
    /// Gene stays, re-linked at the new version
    Carried,
    /// Gene left the panel
    Dropped,
    /// Old-version link of a gene that stays
    Superseded,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Carried => "carried",
            Self::Dropped => "dropped",
            Self::Superseded => "superseded",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One database write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    UpsertGene { gene: Gene },
    UpsertLink { link: PanelGeneLink, kind: LinkKind },
    RetireLink { link: PanelGeneLink, kind: LinkKind },
    RetirePanel { panel: Panel },
    UpsertPanel { panel: Panel },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpsertGene { .. } => "upsert_gene",
            Self::UpsertLink { .. } => "upsert_link",
            Self::RetireLink { .. } => "retire_link",
            Self::RetirePanel { .. } => "retire_panel",
            Self::UpsertPanel { .. } => "upsert_panel",
        }
    }

    pub fn table(&self) -> Table {
        match self {
            Self::UpsertGene { .. } => Table::Genes,
            Self::UpsertLink { .. } | Self::RetireLink { .. } => Table::PanelGeneLinks,
            Self::RetirePanel { .. } | Self::UpsertPanel { .. } => Table::Panels,
        }
    }

    /// The row this operation upserts
    pub fn row(&self) -> Row {
        match self {
            Self::UpsertGene { gene } => gene_row(gene),
            Self::UpsertLink { link, .. } | Self::RetireLink { link, .. } => link_row(link),
            Self::RetirePanel { panel } | Self::UpsertPanel { panel } => panel_row(panel),
        }
    }
}

/// What happens to one registry panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PanelOutcome {
    /// The database already holds this version or a newer one
    AlreadyCurrent {
        db_version: PanelVersion,
        registry_version: PanelVersion,
    },
    /// Nothing in the registry version passes the confidence threshold
    NoQualifyingGenes { registry_version: PanelVersion },
    Update {
        from: Option<PanelVersion>,
        to: PanelVersion,
        operations: Vec<Operation>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelPlan {
    pub panel_id: PanelId,
    #[serde(flatten)]
    pub outcome: PanelOutcome,
}

/// The planned writes of one run, ordered by panel id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub panels: Vec<PanelPlan>,
}

impl ChangeSet {
    /// Panels that will be updated, with their operations
    pub fn updates(&self) -> impl Iterator<Item = (&PanelId, &[Operation])> {
        self.panels.iter().filter_map(|plan| match &plan.outcome {
            PanelOutcome::Update { operations, .. } => Some((&plan.panel_id, operations.as_slice())),
            _ => None,
        })
    }

    /// True when no panel needs an update
    pub fn is_empty(&self) -> bool {
        self.updates().next().is_none()
    }

    pub fn operation_count(&self) -> usize {
        self.updates().map(|(_, ops)| ops.len()).sum()
    }

    /// Write every operation as CSV for review
    ///
    /// Columns: `panel_id, operation, table, panel_version, hgnc_id, detail`.
    ///
    /// # Errors
    ///
    /// Returns `csv::Error` if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["panel_id", "operation", "table", "panel_version", "hgnc_id", "detail"])?;
        for (panel_id, operations) in self.updates() {
            for op in operations {
                let (version, hgnc, detail) = match op {
                    Operation::UpsertGene { gene } => (
                        String::new(),
                        gene.hgnc_id.to_string(),
                        gene.symbol.clone().unwrap_or_default(),
                    ),
                    Operation::UpsertLink { link, kind } | Operation::RetireLink { link, kind } => (
                        link.panel_version.to_string(),
                        link.hgnc_id.to_string(),
                        format!("{kind} ({})", link.confidence_level),
                    ),
                    Operation::RetirePanel { panel } | Operation::UpsertPanel { panel } => {
                        (panel.version.to_string(), String::new(), panel.name.clone())
                    }
                };
                out.write_record([
                    panel_id.as_str(),
                    op.name(),
                    op.table().name(),
                    version.as_str(),
                    hgnc.as_str(),
                    detail.as_str(),
                ])?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Plan the updates that bring `current` in line with `authoritative`
///
/// Deterministic: identical input gives an equal `ChangeSet`. Every panel
/// carries the gene rows its links need, so panels apply independently.
///
/// Links already written at the registry version by an interrupted run are
/// kept current; everything else current on the panel is retired.
pub fn plan(current: &Snapshot, authoritative: &Snapshot, min_confidence: Confidence) -> ChangeSet {
    let known_genes = current.genes_by_id();
    let registry_genes = authoritative.genes_by_id();
    let mut panels = Vec::new();

    for panel_id in authoritative.panel_ids() {
        let Some(registry_panel) = authoritative.current_panel(&panel_id) else {
            continue;
        };
        let registry_version = registry_panel.version;
        let db_version = current.current_version(&panel_id);

        if let Some(db_version) = db_version.filter(|v| registry_version <= *v) {
            debug!(panel_id = %panel_id, %db_version, %registry_version, "Panel already current");
            panels.push(PanelPlan {
                panel_id,
                outcome: PanelOutcome::AlreadyCurrent {
                    db_version,
                    registry_version,
                },
            });
            continue;
        }

        let qualifying = qualifying_links(authoritative, &panel_id, registry_version, min_confidence);
        if qualifying.is_empty() {
            info!(panel_id = %panel_id, %registry_version, "No qualifying genes, panel not updated");
            panels.push(PanelPlan {
                panel_id,
                outcome: PanelOutcome::NoQualifyingGenes { registry_version },
            });
            continue;
        }

        let old_links: Vec<&PanelGeneLink> = current.current_links(&panel_id).collect();
        // Genes of the database version, retired or not, so a retry after a
        // partial apply labels links the same way as the first run
        let old_genes: BTreeSet<HgncId> = current
            .links
            .iter()
            .filter(|l| l.panel_id == panel_id && Some(l.panel_version) == db_version)
            .map(|l| l.hgnc_id)
            .collect();
        let mut operations = Vec::new();

        for (&hgnc_id, &confidence) in &qualifying {
            let wanted = registry_genes
                .get(&hgnc_id)
                .map_or_else(|| Gene::new(hgnc_id, confidence), |g| (*g).clone());
            let merged = merge_gene(known_genes.get(&hgnc_id).copied(), wanted);
            if known_genes.get(&hgnc_id).copied() != Some(&merged) {
                operations.push(Operation::UpsertGene { gene: merged });
            }
        }

        for (&hgnc_id, &confidence) in &qualifying {
            let kind = if old_genes.contains(&hgnc_id) {
                LinkKind::Carried
            } else {
                LinkKind::Added
            };
            operations.push(Operation::UpsertLink {
                link: PanelGeneLink::new(panel_id.clone(), registry_version, hgnc_id, confidence),
                kind,
            });
        }

        // Same key as an upserted link; retiring it would overwrite the upsert
        let mut retiring: Vec<&PanelGeneLink> = old_links
            .into_iter()
            .filter(|l| !(l.panel_version == registry_version && qualifying.contains_key(&l.hgnc_id)))
            .collect();
        retiring.sort_by_key(|l| (l.hgnc_id, l.panel_version));
        for link in retiring {
            let kind = if qualifying.contains_key(&link.hgnc_id) {
                LinkKind::Superseded
            } else {
                LinkKind::Dropped
            };
            operations.push(Operation::RetireLink {
                link: link.clone().retired(),
                kind,
            });
        }

        let previous = current.current_panel(&panel_id);
        let mut retired_panels: Vec<&Panel> = current
            .panels
            .iter()
            .filter(|p| p.is_current() && p.panel_id == panel_id)
            .collect();
        retired_panels.sort_by_key(|p| p.version);
        for panel in retired_panels {
            operations.push(Operation::RetirePanel {
                panel: panel.clone().with_status(RecordStatus::Retired),
            });
        }

        let mut new_panel = registry_panel.clone().with_status(RecordStatus::Current);
        if new_panel.clinical_indication_code.is_none() {
            new_panel.clinical_indication_code =
                previous.and_then(|p| p.clinical_indication_code.clone());
        }
        operations.push(Operation::UpsertPanel { panel: new_panel });

        info!(
            panel_id = %panel_id,
            from = ?db_version.map(|v| v.to_string()),
            to = %registry_version,
            operations = operations.len(),
            "Planned panel update"
        );
        panels.push(PanelPlan {
            panel_id,
            outcome: PanelOutcome::Update {
                from: db_version,
                to: registry_version,
                operations,
            },
        });
    }

    ChangeSet { panels }
}

/// Current registry links of one panel version at or above the threshold,
/// by gene (highest confidence wins)
fn qualifying_links(
    authoritative: &Snapshot,
    panel_id: &PanelId,
    version: PanelVersion,
    min_confidence: Confidence,
) -> BTreeMap<HgncId, Confidence> {
    let mut genes: BTreeMap<HgncId, Confidence> = BTreeMap::new();
    for link in authoritative.current_links(panel_id) {
        if link.panel_version != version || link.confidence_level < min_confidence {
            continue;
        }
        let entry = genes.entry(link.hgnc_id).or_insert(link.confidence_level);
        *entry = (*entry).max(link.confidence_level);
    }
    genes
}

/// Registry values win where the registry has them
fn merge_gene(known: Option<&Gene>, wanted: Gene) -> Gene {
    let Some(known) = known else {
        return wanted;
    };
    Gene {
        hgnc_id: known.hgnc_id,
        symbol: wanted.symbol.or_else(|| known.symbol.clone()),
        confidence_level: wanted.confidence_level,
        mode_of_inheritance: wanted
            .mode_of_inheritance
            .or_else(|| known.mode_of_inheritance.clone()),
    }
}
