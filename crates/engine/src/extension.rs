//! Appending service-derived columns.

use serde::{Deserialize, Serialize};

use annotab_core::{CellKey, ColumnId, RowId, SEPARATOR};

use crate::cell::{Cell, MetadataCandidate};
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::reconcile::{fill_cell, MergeReport};
use crate::status::refresh_column_status;
use crate::store::TableStore;
use crate::table::Column;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionCell {
    #[serde(rename = "id")]
    pub key: CellKey,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub metadata: Vec<MetadataCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedColumn {
    pub id: ColumnId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub cells: Vec<ExtensionCell>,
}

/// New columns produced by an extension service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionBatch {
    pub columns: Vec<ExtendedColumn>,
}

impl TableStore {
    /// Append the batch's columns as one patch. Every existing row gets a
    /// cell in each new column; cells for missing rows are skipped.
    pub fn apply_extension(
        &mut self,
        batch: ExtensionBatch,
        undoable: bool,
    ) -> Result<MergeReport, StoreError> {
        let mut seen: Vec<&ColumnId> = Vec::new();
        for column in &batch.columns {
            let raw = column.id.as_str();
            if raw.is_empty() || raw.contains(SEPARATOR) {
                return Err(StoreError::InvalidColumnId(column.id.clone()));
            }
            if self.state.entities.columns.contains(&column.id) || seen.contains(&&column.id) {
                return Err(StoreError::DuplicateColumn(column.id.clone()));
            }
            seen.push(&column.id);
        }

        let report = self.apply_undoable(
            "apply_extension",
            undoable,
            |draft| {
                let mut report = MergeReport::default();
                let row_ids: Vec<RowId> = draft.entities.rows.all_ids.clone();

                for extended in batch.columns {
                    let mut column = Column::new(extended.id.clone(), extended.label);
                    column.kind = extended.kind;
                    draft.entities.columns.push(extended.id.clone(), column);
                    report.touch_column(&extended.id);

                    for row_id in &row_ids {
                        if let Some(row) = draft.entities.rows.get_mut(row_id) {
                            row.cells
                                .insert(extended.id.clone(), Cell::new(row_id.clone(), ""));
                        }
                    }

                    for item in extended.cells {
                        if item.key.column != extended.id {
                            log::warn!(
                                "extension: cell {} does not belong to column {}",
                                item.key,
                                extended.id
                            );
                            report.skipped.push(item.key);
                            continue;
                        }
                        let Some(cell) = draft.entities.cell_mut(&item.key) else {
                            log::warn!("extension: skipping stale cell {}", item.key);
                            report.skipped.push(item.key);
                            continue;
                        };
                        cell.label = item.label;
                        if !item.metadata.is_empty() {
                            fill_cell(cell, item.metadata, None);
                        }
                        report.merged += 1;
                    }
                    refresh_column_status(&mut draft.entities, &extended.id);
                }
                Ok(report)
            },
            |draft, _| draft.table.touch(),
        )?;

        for key in &report.skipped {
            self.events.push(StoreEvent::StaleSkipped { key: key.clone() });
        }
        Ok(report)
    }
}
