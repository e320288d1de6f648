use std::collections::{BTreeSet, HashMap};

use crate::canonical::AmbiguousGeneError;
use crate::core::gene::Gene;
use crate::core::types::HgncId;
use crate::parsing::hgnc::HgncRecord;

/// How a symbol was attached to an id, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Approved,
    Previous,
    Alias,
}

/// Symbol to HGNC id lookup
///
/// Approved symbols win over previous symbols, which win over aliases. A
/// symbol is resolved only if the best tier that knows it names exactly one
/// id. The index is immutable once built.
#[derive(Debug, Default, Clone)]
pub struct GeneResolver {
    by_symbol: HashMap<String, [BTreeSet<HgncId>; 3]>,
}

impl GeneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the approved symbols of a genes table
    pub fn from_genes(genes: &[Gene]) -> Self {
        let mut resolver = Self::new();
        for gene in genes {
            if let Some(symbol) = &gene.symbol {
                resolver.insert(symbol, gene.hgnc_id);
            }
        }
        resolver
    }

    /// Index an HGNC complete set, including previous symbols and aliases
    pub fn from_hgnc_records(records: &[HgncRecord]) -> Self {
        let mut resolver = Self::new();
        for record in records {
            resolver.insert(&record.symbol, record.hgnc_id);
            for prev in &record.previous_symbols {
                resolver.add(prev, record.hgnc_id, Tier::Previous);
            }
            for alias in &record.alias_symbols {
                resolver.add(alias, record.hgnc_id, Tier::Alias);
            }
        }
        resolver
    }

    /// Register an approved symbol
    pub fn insert(&mut self, symbol: &str, hgnc_id: HgncId) {
        self.add(symbol, hgnc_id, Tier::Approved);
    }

    fn add(&mut self, symbol: &str, hgnc_id: HgncId, tier: Tier) {
        let key = normalize_symbol(symbol);
        if key.is_empty() {
            return;
        }
        self.by_symbol.entry(key).or_default()[tier as usize].insert(hgnc_id);
    }

    /// Resolve a gene token, which may already be an HGNC id
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousGeneError` when the symbol is unknown or maps to more
    /// than one id at its best tier.
    pub fn resolve(&self, token: &str) -> Result<HgncId, AmbiguousGeneError> {
        if let Ok(id) = token.parse::<HgncId>() {
            return Ok(id);
        }

        let tiers = self.by_symbol.get(&normalize_symbol(token));
        let candidates = tiers
            .and_then(|tiers| tiers.iter().find(|ids| !ids.is_empty()))
            .cloned()
            .unwrap_or_default();

        if candidates.len() == 1 {
            if let Some(&id) = candidates.iter().next() {
                return Ok(id);
            }
        }
        Err(AmbiguousGeneError::new(token, candidates.into_iter().collect()))
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// Resolve `token` with an optional resolver; without one only literal HGNC
/// ids are accepted
pub(crate) fn resolve_token(
    resolver: Option<&GeneResolver>,
    token: &str,
) -> Result<HgncId, AmbiguousGeneError> {
    match resolver {
        Some(resolver) => resolver.resolve(token),
        None => token
            .parse::<HgncId>()
            .map_err(|_| AmbiguousGeneError::new(token, Vec::new())),
    }
}

fn normalize_symbol(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}
