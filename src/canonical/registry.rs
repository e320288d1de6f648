use std::collections::BTreeMap;

use tracing::warn;

use super::resolver::{resolve_token, GeneResolver};
use super::{AmbiguityPolicy, CanonicalSet, CanonicalizeError, SchemaError};
use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::panel::Panel;
use crate::core::types::{Confidence, HgncId, PanelSource};
use crate::registry::{PanelDefinition, RegistryGene};
use crate::store::columns;

const INPUT: &str = "registry";

/// Canonicalize registry panel definitions
///
/// Every definition becomes a current PanelApp panel. A gene listed twice in
/// one panel keeps its highest confidence. Under [`AmbiguityPolicy::Skip`] a
/// panel with an unresolvable gene is left out entirely.
///
/// # Errors
///
/// Returns `CanonicalizeError::Schema` for a gene with neither an HGNC id nor
/// a symbol, or with an unknown confidence level, and
/// `CanonicalizeError::AmbiguousGene` under [`AmbiguityPolicy::Abort`].
pub fn from_registry(
    definitions: &[PanelDefinition],
    resolver: Option<&GeneResolver>,
    policy: AmbiguityPolicy,
) -> Result<CanonicalSet, CanonicalizeError> {
    let mut set = CanonicalSet::default();
    let mut genes: BTreeMap<HgncId, Gene> = BTreeMap::new();

    'panels: for (index, definition) in definitions.iter().enumerate() {
        let row = index + 1;
        let mut panel_genes: BTreeMap<HgncId, Gene> = BTreeMap::new();

        for gene in &definition.genes {
            let token = gene_token(gene).ok_or(SchemaError::MissingValue {
                input: INPUT,
                column: columns::HGNC_ID,
                row,
            })?;
            let confidence: Confidence =
                gene.confidence_level
                    .parse()
                    .map_err(|error| SchemaError::InvalidValue {
                        input: INPUT,
                        column: columns::CONFIDENCE_LEVEL,
                        row,
                        error,
                    })?;

            let hgnc_id = match resolve_token(resolver, token) {
                Ok(id) => id,
                Err(error) => {
                    set.skip_or_abort(error.at(row, &definition.id), policy)?;
                    continue 'panels;
                }
            };

            let mut canonical = Gene::new(hgnc_id, confidence);
            canonical.symbol = gene.symbol.clone();
            canonical.mode_of_inheritance = gene.mode_of_inheritance.clone();

            match panel_genes.get_mut(&hgnc_id) {
                Some(existing) => {
                    warn!(
                        panel_id = %definition.id,
                        hgnc_id = %hgnc_id,
                        "Gene listed twice in registry panel"
                    );
                    if confidence > existing.confidence_level {
                        *existing = canonical;
                    }
                }
                None => {
                    panel_genes.insert(hgnc_id, canonical);
                }
            }
        }

        let mut panel = Panel::new(definition.id.as_str(), &definition.name, definition.version)
            .with_source(PanelSource::PanelApp);
        if let Some(date) = definition.signed_off {
            panel = panel.with_signoff_date(date);
        }
        set.snapshot.panels.push(panel);

        for (hgnc_id, gene) in panel_genes {
            set.snapshot.links.push(PanelGeneLink::new(
                definition.id.clone(),
                definition.version,
                hgnc_id,
                gene.confidence_level,
            ));
            match genes.get(&hgnc_id) {
                Some(known) if known.confidence_level >= gene.confidence_level => {}
                _ => {
                    genes.insert(hgnc_id, gene);
                }
            }
        }
    }

    set.snapshot.genes = genes.into_values().collect();
    Ok(set)
}

fn gene_token(gene: &RegistryGene) -> Option<&str> {
    gene.hgnc_id
        .as_deref()
        .or(gene.symbol.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
