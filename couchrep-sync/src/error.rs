//! Error types for couchrep-sync.
//!
//! Both multi-step flows stop at the first host failure and hand back what
//! they completed before it.

use thiserror::Error;

use couchrep_core::{DirectiveId, StoreError};

use crate::reconcile::ReconcileReport;
use crate::registry::Registry;

/// Reconciliation aborted; `report` holds the outcomes recorded before the failure.
#[derive(Debug, Error)]
#[error("reconciliation stopped after {} database(s): {source}", .report.outcomes.len())]
pub struct ReconcileError {
    pub report: ReconcileReport,
    #[source]
    pub source: StoreError,
}

/// Bulk deletion aborted.
#[derive(Debug, Error)]
#[error("deletion stopped after {} directive(s): {source}", .deleted.len())]
pub struct DeleteAllError {
    /// Registry as loaded before deleting; empty if loading itself failed.
    pub snapshot: Registry,
    /// Directives removed before the failure, in deletion order.
    pub deleted: Vec<DirectiveId>,
    #[source]
    pub source: StoreError,
}
