//! Store operations as data.
//!
//! `StoreOp` carries one variant per store operation so that scripted
//! edits (the CLI reads them from JSON) go through the same code paths as
//! direct method calls. Whether an operation is recorded in history is an
//! argument of [`TableStore::apply`], never part of the payload.

use serde::{Deserialize, Serialize};

use annotab_core::{CellKey, ColumnId, RowId};

use crate::error::StoreError;
use crate::extension::ExtensionBatch;
use crate::history::HistoryError;
use crate::reconcile::{MergeReport, ReconciliationBatch};
use crate::store::{TableStore, TableUpdate};
use crate::ui::UiUpdate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    RestoreInitialState,
    UpdateCurrentTable(TableUpdate),
    UpdateUi(UiUpdate),
    UpdateCellEditable {
        cell: CellKey,
    },
    UpdateCellLabel {
        cell: CellKey,
        value: String,
    },
    UpdateCellMetadata {
        cell: CellKey,
        metadata_id: String,
    },
    /// Without a threshold the store's configured one is used.
    AutoMatching {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
    },
    UpdateSelectedCellExpanded,
    SelectColumn {
        id: ColumnId,
    },
    SelectRow {
        id: RowId,
        #[serde(default)]
        multi: bool,
    },
    SelectCell {
        id: CellKey,
        #[serde(default)]
        multi: bool,
    },
    ClearSelection,
    DeleteColumn {
        id: ColumnId,
    },
    DeleteRow {
        id: RowId,
    },
    DeleteSelected,
    Undo,
    Redo,
    ApplyReconciliation(ReconciliationBatch),
    ApplyExtension(ExtensionBatch),
}

impl StoreOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RestoreInitialState => "restore_initial_state",
            Self::UpdateCurrentTable(_) => "update_current_table",
            Self::UpdateUi(_) => "update_ui",
            Self::UpdateCellEditable { .. } => "update_cell_editable",
            Self::UpdateCellLabel { .. } => "update_cell_label",
            Self::UpdateCellMetadata { .. } => "update_cell_metadata",
            Self::AutoMatching { .. } => "auto_matching",
            Self::UpdateSelectedCellExpanded => "update_selected_cell_expanded",
            Self::SelectColumn { .. } => "select_column",
            Self::SelectRow { .. } => "select_row",
            Self::SelectCell { .. } => "select_cell",
            Self::ClearSelection => "clear_selection",
            Self::DeleteColumn { .. } => "delete_column",
            Self::DeleteRow { .. } => "delete_row",
            Self::DeleteSelected => "delete_selected",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::ApplyReconciliation(_) => "apply_reconciliation",
            Self::ApplyExtension(_) => "apply_extension",
        }
    }
}

/// What an applied operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutcome {
    Done,
    Merged(MergeReport),
    /// Undo or redo hit the end of history. Not an error.
    Nothing(HistoryError),
}

impl TableStore {
    /// Run one operation. `undoable` only matters for operations that
    /// change entities through history.
    pub fn apply(&mut self, op: StoreOp, undoable: bool) -> Result<OpOutcome, StoreError> {
        match op {
            StoreOp::RestoreInitialState => self.restore_initial_state(),
            StoreOp::UpdateCurrentTable(update) => self.update_current_table(update),
            StoreOp::UpdateUi(update) => self.update_ui(update),
            StoreOp::UpdateCellEditable { cell } => self.update_cell_editable(&cell)?,
            StoreOp::UpdateCellLabel { cell, value } => {
                self.update_cell_label(&cell, value, undoable)?
            }
            StoreOp::UpdateCellMetadata { cell, metadata_id } => {
                self.update_cell_metadata(&cell, &metadata_id, undoable)?
            }
            StoreOp::AutoMatching { threshold } => {
                let threshold = threshold.unwrap_or(self.matching_threshold());
                self.auto_matching(threshold, undoable)?
            }
            StoreOp::UpdateSelectedCellExpanded => self.update_selected_cell_expanded()?,
            StoreOp::SelectColumn { id } => self.select_column(&id)?,
            StoreOp::SelectRow { id, multi } => self.select_row(&id, multi)?,
            StoreOp::SelectCell { id, multi } => self.select_cell(&id, multi)?,
            StoreOp::ClearSelection => self.clear_selection(),
            StoreOp::DeleteColumn { id } => self.delete_column(&id, undoable)?,
            StoreOp::DeleteRow { id } => self.delete_row(&id, undoable)?,
            StoreOp::DeleteSelected => self.delete_selected(undoable)?,
            StoreOp::Undo => {
                if let Err(e) = self.undo() {
                    return Ok(OpOutcome::Nothing(e));
                }
            }
            StoreOp::Redo => {
                if let Err(e) = self.redo() {
                    return Ok(OpOutcome::Nothing(e));
                }
            }
            StoreOp::ApplyReconciliation(batch) => {
                return self.apply_reconciliation(batch, undoable).map(OpOutcome::Merged)
            }
            StoreOp::ApplyExtension(batch) => {
                return self.apply_extension(batch, undoable).map(OpOutcome::Merged)
            }
        }
        Ok(OpOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_store;

    #[test]
    fn ops_parse_from_tagged_json() {
        let ops: Vec<StoreOp> = serde_json::from_str(
            r#"[
                {"op": "select_cell", "id": "r1$c1"},
                {"op": "update_cell_label", "cell": "r1$c1", "value": "Roma"},
                {"op": "auto_matching", "threshold": 0.5},
                {"op": "undo"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            ops[0],
            StoreOp::SelectCell { id: CellKey::new("r1", "c1"), multi: false }
        );
        assert_eq!(ops[3], StoreOp::Undo);
        assert_eq!(ops[2], StoreOp::AutoMatching { threshold: Some(0.5) });
        assert_eq!(ops[2].name(), "auto_matching");
    }

    #[test]
    fn malformed_key_in_json_is_rejected() {
        let err = serde_json::from_str::<StoreOp>(r#"{"op": "select_cell", "id": "r1c1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn apply_dispatches_and_reports_history_bounds() {
        let mut store = sample_store();
        let outcome = store
            .apply(
                StoreOp::UpdateCellLabel { cell: CellKey::new("r1", "c1"), value: "Roma".into() },
                true,
            )
            .unwrap();
        assert_eq!(outcome, OpOutcome::Done);
        assert!(store.can_undo());

        assert_eq!(store.apply(StoreOp::Undo, true).unwrap(), OpOutcome::Done);
        assert_eq!(
            store.apply(StoreOp::Undo, true).unwrap(),
            OpOutcome::Nothing(HistoryError::NothingToUndo)
        );
    }

    #[test]
    fn apply_respects_undoable_flag() {
        let mut store = sample_store();
        store
            .apply(StoreOp::DeleteColumn { id: ColumnId::from("c1") }, false)
            .unwrap();
        assert!(!store.can_undo());
        assert_eq!(store.columns().count(), 1);
    }

    #[test]
    fn auto_matching_falls_back_to_store_threshold() {
        let op: StoreOp = serde_json::from_str(r#"{"op": "auto_matching"}"#).unwrap();
        assert_eq!(op, StoreOp::AutoMatching { threshold: None });

        let key = CellKey::new("r1", "c1");
        let with_candidate = || {
            let mut store = sample_store();
            store.state.entities.cell_mut(&key).unwrap().metadata.values =
                vec![crate::cell::MetadataCandidate::new("Q1", "Rome", 0.6)];
            store.select_cell(&key, false).unwrap();
            store
        };

        let mut strict = with_candidate();
        strict.apply(op.clone(), true).unwrap();
        assert!(strict.cell(&key).unwrap().metadata.matched().is_none());

        let mut lenient = with_candidate();
        lenient.set_matching_threshold(0.5);
        lenient.apply(op, true).unwrap();
        assert_eq!(lenient.cell(&key).unwrap().metadata.matched().unwrap().id, "Q1");
    }
}
