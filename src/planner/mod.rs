//! Turning registry content into safe, idempotent database updates.
//!
//! [`plan`] is pure: it compares the current database snapshot with the
//! authoritative registry snapshot and returns a [`ChangeSet`]. [`apply`]
//! performs the writes, or with `dry_run` only reports them.
//!
//! ## Rules
//!
//! - Registry links below the confidence threshold are never written.
//! - A panel is only updated to a strictly newer version than the database's
//!   current one, so re-running a plan is harmless.
//! - A panel left with no qualifying genes is not updated.
//! - Superseded panel rows and links are retired, never deleted.
//! - Panels the registry does not mention are left alone.

use thiserror::Error;

use crate::core::snapshot::Snapshot;
use crate::core::types::{Confidence, PanelId, PanelSource};

pub mod apply;
pub mod plan;

pub use apply::{apply, ApplyFailure, ApplyResult};
pub use plan::{plan, ChangeSet, LinkKind, Operation, PanelOutcome, PanelPlan};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("{} panel(s) failed to apply: {}", .failures.len(), format_failures(.failures))]
    PartialApply { failures: Vec<ApplyFailure> },
}

fn format_failures(failures: &[ApplyFailure]) -> String {
    failures
        .iter()
        .map(|f| f.panel_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Operational settings of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Lowest registry confidence written to the database
    pub min_confidence: Confidence,
    /// Report writes without performing them
    pub dry_run: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_confidence: Confidence::Green,
            dry_run: true,
        }
    }
}

/// Panels the registry should be asked about: every current PanelApp panel
pub fn registry_panels(current: &Snapshot) -> Vec<PanelId> {
    let mut ids: Vec<PanelId> = current
        .panels
        .iter()
        .filter(|p| p.is_current() && p.source == PanelSource::PanelApp)
        .map(|p| p.panel_id.clone())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}
