//! Merging reconciliation results into the store.
//!
//! Results may arrive after the user deleted rows or columns they address.
//! Such keys are skipped and reported; they never fail the batch.

use serde::{Deserialize, Serialize};

use annotab_core::{CellKey, ColumnId};

use crate::cell::{Cell, MatchReason, MetadataCandidate, ReconciliatorRef};
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::status::refresh_column_status;
use crate::store::TableStore;

/// Candidates a service returned for one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    #[serde(rename = "id")]
    pub key: CellKey,
    pub metadata: Vec<MetadataCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationBatch {
    pub reconciliator: ReconciliatorRef,
    pub items: Vec<CellUpdate>,
}

/// Outcome of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Number of cells updated.
    pub merged: usize,
    /// Keys that no longer resolve to a cell.
    pub skipped: Vec<CellKey>,
    /// Columns whose status was recomputed, in first-touched order.
    pub columns: Vec<ColumnId>,
}

impl MergeReport {
    pub(crate) fn touch_column(&mut self, id: &ColumnId) {
        if !self.columns.contains(id) {
            self.columns.push(id.clone());
        }
    }
}

/// Keep at most one matched candidate: the first one flagged.
pub(crate) fn normalize_matches(values: &mut [MetadataCandidate]) {
    let mut seen = false;
    for m in values {
        if m.matched {
            m.matched = !seen;
            seen = true;
        }
    }
}

pub(crate) fn fill_cell(cell: &mut Cell, metadata: Vec<MetadataCandidate>, reconciliator: Option<ReconciliatorRef>) {
    cell.metadata.values = metadata;
    normalize_matches(&mut cell.metadata.values);
    cell.metadata.reconciliator = reconciliator;
    cell.refresh_annotation(MatchReason::Reconciliator);
}

impl TableStore {
    /// Merge a reconciliation batch as one patch.
    pub fn apply_reconciliation(
        &mut self,
        batch: ReconciliationBatch,
        undoable: bool,
    ) -> Result<MergeReport, StoreError> {
        let ReconciliationBatch { reconciliator, items } = batch;

        let report = self.apply_undoable(
            "apply_reconciliation",
            undoable,
            |draft| {
                let mut report = MergeReport::default();
                for item in items {
                    if !draft.entities.has_cell(&item.key) {
                        log::warn!("reconciliation: skipping stale cell {}", item.key);
                        report.skipped.push(item.key);
                        continue;
                    }
                    let Some(cell) = draft.entities.cell_mut(&item.key) else {
                        continue;
                    };
                    fill_cell(cell, item.metadata, Some(reconciliator.clone()));
                    report.merged += 1;
                    report.touch_column(&item.key.column);
                }

                for column in &report.columns {
                    if let Some(col) = draft.entities.columns.get_mut(column) {
                        col.reconciliators.insert(reconciliator.id.clone());
                    }
                    refresh_column_status(&mut draft.entities, column);
                }
                Ok(report)
            },
            |draft, report| {
                if report.merged > 0 {
                    draft.table.touch();
                }
            },
        )?;

        log::debug!(
            "reconciliation '{}': merged {}, skipped {}",
            reconciliator.id,
            report.merged,
            report.skipped.len()
        );
        for key in &report.skipped {
            self.events.push(StoreEvent::StaleSkipped { key: key.clone() });
        }
        Ok(report)
    }
}
