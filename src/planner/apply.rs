use serde::Serialize;
use tracing::{error, info};

use crate::core::types::PanelId;
use crate::store::{Database, Row, StoreError, Table};

use super::plan::{ChangeSet, Operation, PanelOutcome};
use super::PlannerError;

/// A panel whose writes were rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub panel_id: PanelId,
    pub error: String,
}

/// Outcome of applying a [`ChangeSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    pub dry_run: bool,
    /// Panels written (or, in a dry run, that would be written)
    pub updated: Vec<PanelId>,
    /// Panels planned without an update
    pub unchanged: Vec<PanelId>,
    /// Rows written; the planned row count in a dry run
    pub rows_written: usize,
    pub failures: Vec<ApplyFailure>,
}

impl ApplyResult {
    /// # Errors
    ///
    /// Returns `PlannerError::PartialApply` if any panel failed.
    pub fn into_result(self) -> Result<Self, PlannerError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(PlannerError::PartialApply {
                failures: self.failures,
            })
        }
    }
}

/// Write a [`ChangeSet`] to the database, panel by panel
///
/// Each panel's operations are written in plan order, grouped into one upsert
/// per consecutive run of operations on the same table. A failed panel is
/// recorded and the remaining panels are still applied. With `dry_run` the
/// database is not touched.
pub fn apply(changes: &ChangeSet, db: &mut impl Database, dry_run: bool) -> ApplyResult {
    let mut result = ApplyResult {
        dry_run,
        ..ApplyResult::default()
    };

    for plan in &changes.panels {
        if !matches!(plan.outcome, PanelOutcome::Update { .. }) {
            result.unchanged.push(plan.panel_id.clone());
        }
    }

    for (panel_id, operations) in changes.updates() {
        if dry_run {
            info!(panel_id = %panel_id, operations = operations.len(), "Dry run, not writing");
            result.updated.push(panel_id.clone());
            result.rows_written += operations.len();
            continue;
        }

        match write_panel(db, operations) {
            Ok(rows) => {
                info!(panel_id = %panel_id, rows, "Applied panel update");
                result.updated.push(panel_id.clone());
                result.rows_written += rows;
            }
            Err(e) => {
                error!(panel_id = %panel_id, error = %e, "Failed to apply panel update");
                result.failures.push(ApplyFailure {
                    panel_id: panel_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    result
}

fn write_panel(db: &mut impl Database, operations: &[Operation]) -> Result<usize, StoreError> {
    let mut written = 0;
    let mut batch: Vec<Row> = Vec::new();
    let mut batch_table: Option<Table> = None;

    for op in operations {
        let table = op.table();
        if let Some(current) = batch_table.filter(|t| *t != table) {
            written += db.upsert(current, &batch)?;
            batch.clear();
        }
        batch_table = Some(table);
        batch.push(op.row());
    }
    if let Some(table) = batch_table {
        written += db.upsert(table, &batch)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::load_database;
    use crate::core::gene::{Gene, PanelGeneLink};
    use crate::core::panel::Panel;
    use crate::core::snapshot::Snapshot;
    use crate::core::types::{Confidence, HgncId, PanelVersion};
    use crate::genepanels::build;
    use crate::planner::{plan, LinkKind};
    use crate::store::json::JsonStore;
    use crate::store::rows::{gene_row, link_row, panel_row};

    fn v(major: u32, minor: u32) -> PanelVersion {
        PanelVersion::new(major, minor)
    }

    fn seeded_store() -> JsonStore {
        let mut store = JsonStore::new();
        store
            .upsert(
                Table::Panels,
                &[panel_row(&Panel::new("1", "Panel one", v(1, 0)).with_indication("R1"))],
            )
            .unwrap();
        store
            .upsert(
                Table::Genes,
                &[gene_row(&Gene::new(HgncId::new(1), Confidence::Green))],
            )
            .unwrap();
        store
            .upsert(
                Table::PanelGeneLinks,
                &[link_row(&PanelGeneLink::new(
                    PanelId::new("1"),
                    v(1, 0),
                    HgncId::new(1),
                    Confidence::Green,
                ))],
            )
            .unwrap();
        store
    }

    fn registry() -> Snapshot {
        let id = PanelId::new("1");
        Snapshot::new(
            vec![Panel::new("1", "Panel one", v(2, 0))],
            vec![
                Gene::new(HgncId::new(1), Confidence::Green),
                Gene::new(HgncId::new(2), Confidence::Amber),
                Gene::new(HgncId::new(3), Confidence::Green),
            ],
            vec![
                PanelGeneLink::new(id.clone(), v(2, 0), HgncId::new(1), Confidence::Green),
                PanelGeneLink::new(id.clone(), v(2, 0), HgncId::new(2), Confidence::Amber),
                PanelGeneLink::new(id, v(2, 0), HgncId::new(3), Confidence::Green),
            ],
        )
    }

    /// Database that rejects writes to one table, `remaining` times
    struct RejectingStore {
        inner: JsonStore,
        reject: Table,
        remaining: usize,
    }

    impl RejectingStore {
        fn new(inner: JsonStore, reject: Table) -> Self {
            Self {
                inner,
                reject,
                remaining: usize::MAX,
            }
        }
    }

    impl Database for RejectingStore {
        fn read(&self, table: Table) -> Result<Vec<Row>, StoreError> {
            self.inner.read(table)
        }

        fn upsert(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError> {
            if table == self.reject && self.remaining > 0 {
                self.remaining -= 1;
                return Err(StoreError::Rejected(format!("{table} is read-only")));
            }
            self.inner.upsert(table, rows)
        }
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut store = seeded_store();
        let current = load_database(&store).unwrap();
        let changes = plan(&current, &registry(), Confidence::Green);

        let result = apply(&changes, &mut store, true);
        assert!(result.dry_run);
        assert_eq!(result.updated, vec![PanelId::new("1")]);
        assert_eq!(result.rows_written, changes.operation_count());
        assert_eq!(store.len(Table::Panels), 1);
        assert_eq!(store.len(Table::PanelGeneLinks), 1);
    }

    #[test]
    fn test_apply_then_replan_is_empty() {
        let mut store = seeded_store();
        let current = load_database(&store).unwrap();
        let changes = plan(&current, &registry(), Confidence::Green);

        let result = apply(&changes, &mut store, false).into_result().unwrap();
        assert_eq!(result.rows_written, changes.operation_count());

        let after = load_database(&store).unwrap();
        assert_eq!(after.current_version(&PanelId::new("1")), Some(v(2, 0)));
        assert_eq!(after.panels.len(), 2);
        let current_genes: Vec<u32> = after
            .current_links(&PanelId::new("1"))
            .map(|l| l.hgnc_id.number())
            .collect();
        assert_eq!(current_genes.len(), 2);
        assert!(!current_genes.contains(&2));

        // The retired 1.0 rows stay in the store
        assert_eq!(after.links.iter().filter(|l| !l.is_current()).count(), 1);

        let replanned = plan(&after, &registry(), Confidence::Green);
        assert!(replanned.is_empty());
        let again = apply(&replanned, &mut store, false);
        assert_eq!(again.rows_written, 0);
        assert_eq!(again.unchanged, vec![PanelId::new("1")]);
    }

    #[test]
    fn test_failed_panel_is_reported() {
        let mut store = RejectingStore::new(seeded_store(), Table::PanelGeneLinks);
        let current = load_database(&store).unwrap();
        let changes = plan(&current, &registry(), Confidence::Green);

        let result = apply(&changes, &mut store, false);
        assert!(result.updated.is_empty());
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.contains("read-only"));

        let err = result.into_result().unwrap_err();
        assert!(err.to_string().contains("1 panel(s) failed to apply: 1"));
    }

    #[test]
    fn test_retry_after_failed_panel_row_write() {
        let mut store = RejectingStore::new(seeded_store(), Table::Panels);
        let current = load_database(&store).unwrap();
        let changes = plan(&current, &registry(), Confidence::Green);
        let first = apply(&changes, &mut store, false);
        assert_eq!(first.failures.len(), 1);

        // Links at 2.0 were written, the 2.0 panel row was not
        let mut store = store.inner;
        let interrupted = load_database(&store).unwrap();
        assert_eq!(interrupted.current_version(&PanelId::new("1")), Some(v(1, 0)));

        let retry = plan(&interrupted, &registry(), Confidence::Green);
        let kinds: Vec<(u32, LinkKind)> = retry
            .updates()
            .flat_map(|(_, ops)| ops)
            .filter_map(|op| match op {
                Operation::UpsertLink { link, kind } => Some((link.hgnc_id.number(), *kind)),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![(1, LinkKind::Carried), (3, LinkKind::Added)]);
        apply(&retry, &mut store, false).into_result().unwrap();

        let after = load_database(&store).unwrap();
        assert_eq!(after.current_version(&PanelId::new("1")), Some(v(2, 0)));
        let mut current_genes: Vec<(PanelVersion, u32)> = after
            .current_links(&PanelId::new("1"))
            .map(|l| (l.panel_version, l.hgnc_id.number()))
            .collect();
        current_genes.sort();
        assert_eq!(current_genes, vec![(v(2, 0), 1), (v(2, 0), 3)]);

        let rows = build(&after.panels, &after.links).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(plan(&after, &registry(), Confidence::Green).is_empty());
    }

    #[test]
    fn test_shared_gene_written_by_each_panel() {
        let mut registry = registry();
        registry.panels.push(Panel::new("5", "Panel five", v(1, 0)));
        registry
            .links
            .push(PanelGeneLink::new(PanelId::new("5"), v(1, 0), HgncId::new(3), Confidence::Green));

        // Only the first gene write, panel 1's, is rejected
        let mut store = RejectingStore::new(seeded_store(), Table::Genes);
        store.remaining = 1;
        let current = load_database(&store).unwrap();
        let changes = plan(&current, &registry, Confidence::Green);

        let result = apply(&changes, &mut store, false);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].panel_id, PanelId::new("1"));
        assert_eq!(result.updated, vec![PanelId::new("5")]);

        let after = load_database(&store.inner).unwrap();
        assert!(after.genes_by_id().contains_key(&HgncId::new(3)));
        let genes = after.genes_by_id();
        assert!(after.links.iter().all(|l| genes.contains_key(&l.hgnc_id)));
    }
}
