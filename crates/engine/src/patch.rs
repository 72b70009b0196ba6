//! Reversible patches over the normalized entity maps.
//!
//! A mutation runs against a cloned draft; `diff(snapshot, draft)` yields the
//! forward patches and `diff(draft, snapshot)` the inverse. Cells are diffed
//! field by field so that bookkeeping fields written outside the diff
//! (`editable`, for one) are never rewound by an undo that only concerns
//! the label.

use std::collections::BTreeSet;

use annotab_core::{CellKey, ColumnId, RowId};

use crate::cell::{AnnotationMeta, Cell, CellMetadata};
use crate::table::{Column, Entities, Row};

/// One changed field of a cell that exists on both sides of a diff.
#[derive(Debug, Clone, PartialEq)]
pub enum CellField {
    Label(String),
    Editable(bool),
    Expanded(bool),
    Annotation(AnnotationMeta),
    Metadata(CellMetadata),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Insert, replace (`Some`) or remove (`None`) a column record.
    Column { id: ColumnId, value: Option<Column> },
    /// Replace the column display order.
    ColumnOrder(Vec<ColumnId>),
    /// Insert, replace or remove a whole row.
    Row { id: RowId, value: Option<Row> },
    /// Replace the row display order.
    RowOrder(Vec<RowId>),
    /// Insert or remove one cell of a row present on both sides.
    Cell { key: CellKey, value: Option<Box<Cell>> },
    /// Overwrite one field of an existing cell.
    CellField { key: CellKey, field: CellField },
}

/// Forward and inverse patches of one recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSet {
    pub forward: Vec<Patch>,
    pub inverse: Vec<Patch>,
}

impl PatchSet {
    /// Diff `before` against `after` in both directions.
    pub fn between(before: &Entities, after: &Entities) -> Self {
        Self {
            forward: diff(before, after),
            inverse: diff(after, before),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Patches that turn `before` into `after`.
pub fn diff(before: &Entities, after: &Entities) -> Vec<Patch> {
    let mut patches = Vec::new();

    let column_ids: BTreeSet<&ColumnId> =
        before.columns.by_id.keys().chain(after.columns.by_id.keys()).collect();
    for id in column_ids {
        let (old, new) = (before.columns.get(id), after.columns.get(id));
        if old != new {
            patches.push(Patch::Column {
                id: id.clone(),
                value: new.cloned(),
            });
        }
    }
    if before.columns.all_ids != after.columns.all_ids {
        patches.push(Patch::ColumnOrder(after.columns.all_ids.clone()));
    }

    let row_ids: BTreeSet<&RowId> =
        before.rows.by_id.keys().chain(after.rows.by_id.keys()).collect();
    for id in row_ids {
        match (before.rows.get(id), after.rows.get(id)) {
            (Some(old), Some(new)) => diff_row(old, new, &mut patches),
            (None, None) => {}
            (_, new) => patches.push(Patch::Row {
                id: id.clone(),
                value: new.cloned(),
            }),
        }
    }
    if before.rows.all_ids != after.rows.all_ids {
        patches.push(Patch::RowOrder(after.rows.all_ids.clone()));
    }

    patches
}

fn diff_row(before: &Row, after: &Row, out: &mut Vec<Patch>) {
    if before == after {
        return;
    }
    let column_ids: BTreeSet<&ColumnId> = before.cells.keys().chain(after.cells.keys()).collect();
    for column in column_ids {
        let key = CellKey {
            row: after.id.clone(),
            column: column.clone(),
        };
        match (before.cells.get(column), after.cells.get(column)) {
            (Some(old), Some(new)) => diff_cell(key, old, new, out),
            (None, None) => {}
            (_, new) => out.push(Patch::Cell {
                key,
                value: new.cloned().map(Box::new),
            }),
        }
    }
}

fn diff_cell(key: CellKey, before: &Cell, after: &Cell, out: &mut Vec<Patch>) {
    let mut field = |field: CellField| {
        out.push(Patch::CellField {
            key: key.clone(),
            field,
        })
    };
    if before.label != after.label {
        field(CellField::Label(after.label.clone()));
    }
    if before.editable != after.editable {
        field(CellField::Editable(after.editable));
    }
    if before.expanded != after.expanded {
        field(CellField::Expanded(after.expanded));
    }
    if before.annotation_meta != after.annotation_meta {
        field(CellField::Annotation(after.annotation_meta.clone()));
    }
    if before.metadata != after.metadata {
        field(CellField::Metadata(after.metadata.clone()));
    }
}

/// Apply patches in order. Returns how many targets were skipped because
/// they no longer exist (possible only when a non-recorded mutation removed
/// them after the patch was taken). An order patch keeps only ids that have
/// a record and counts each dropped id.
pub fn apply(entities: &mut Entities, patches: &[Patch]) -> usize {
    let mut skipped = 0;
    for patch in patches {
        match patch {
            Patch::Column { id, value } => match value {
                Some(column) => {
                    entities.columns.by_id.insert(id.clone(), column.clone());
                }
                None => {
                    entities.columns.by_id.remove(id);
                }
            },
            Patch::ColumnOrder(ids) => {
                let (order, dropped) = present_only(ids, |id| entities.columns.contains(id));
                entities.columns.all_ids = order;
                skipped += dropped;
            }
            Patch::Row { id, value } => match value {
                Some(row) => {
                    entities.rows.by_id.insert(id.clone(), row.clone());
                }
                None => {
                    entities.rows.by_id.remove(id);
                }
            },
            Patch::RowOrder(ids) => {
                let (order, dropped) = present_only(ids, |id| entities.rows.contains(id));
                entities.rows.all_ids = order;
                skipped += dropped;
            }
            Patch::Cell { key, value } => match entities.rows.get_mut(&key.row) {
                Some(row) => match value {
                    Some(cell) => {
                        row.cells.insert(key.column.clone(), (**cell).clone());
                    }
                    None => {
                        row.cells.remove(&key.column);
                    }
                },
                None => skipped += 1,
            },
            Patch::CellField { key, field } => match entities.cell_mut(key) {
                Some(cell) => match field {
                    CellField::Label(v) => cell.label = v.clone(),
                    CellField::Editable(v) => cell.editable = *v,
                    CellField::Expanded(v) => cell.expanded = *v,
                    CellField::Annotation(v) => cell.annotation_meta = v.clone(),
                    CellField::Metadata(v) => cell.metadata = v.clone(),
                },
                None => skipped += 1,
            },
        }
    }
    skipped
}

fn present_only<K: Clone>(ids: &[K], exists: impl Fn(&K) -> bool) -> (Vec<K>, usize) {
    let order: Vec<K> = ids.iter().filter(|id| exists(id)).cloned().collect();
    let dropped = ids.len() - order.len();
    (order, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::MetadataCandidate;

    fn sample() -> Entities {
        let mut e = Entities::default();
        for c in ["c1", "c2"] {
            e.columns.push(ColumnId::from(c), Column::new(c, c.to_uppercase()));
        }
        for r in ["r1", "r2"] {
            let mut row = Row::new(r);
            for c in ["c1", "c2"] {
                row.cells.insert(ColumnId::from(c), Cell::new(RowId::from(r), format!("{r}-{c}")));
            }
            e.rows.push(RowId::from(r), row);
        }
        e
    }

    fn round_trip(before: &Entities, after: &Entities) {
        let set = PatchSet::between(before, after);

        let mut forward = before.clone();
        assert_eq!(apply(&mut forward, &set.forward), 0);
        assert_eq!(&forward, after);

        let mut back = after.clone();
        assert_eq!(apply(&mut back, &set.inverse), 0);
        assert_eq!(&back, before);
    }

    #[test]
    fn identical_entities_produce_no_patches() {
        let e = sample();
        assert!(diff(&e, &e).is_empty());
    }

    #[test]
    fn label_change_is_a_single_field_patch() {
        let before = sample();
        let mut after = before.clone();
        after.cell_mut(&CellKey::new("r1", "c1")).unwrap().label = "new".into();

        let patches = diff(&before, &after);
        assert_eq!(
            patches,
            vec![Patch::CellField {
                key: CellKey::new("r1", "c1"),
                field: CellField::Label("new".into()),
            }]
        );
        round_trip(&before, &after);
    }

    #[test]
    fn column_removal_round_trips() {
        let before = sample();
        let mut after = before.clone();
        after.columns.remove(&ColumnId::from("c1"));
        for row in after.rows.by_id.values_mut() {
            row.cells.remove(&ColumnId::from("c1"));
        }
        round_trip(&before, &after);
    }

    #[test]
    fn row_removal_round_trips_with_order() {
        let before = sample();
        let mut after = before.clone();
        after.rows.remove(&RowId::from("r1"));
        let patches = diff(&before, &after);
        assert!(patches.contains(&Patch::RowOrder(vec![RowId::from("r2")])));
        round_trip(&before, &after);
    }

    #[test]
    fn metadata_change_round_trips() {
        let before = sample();
        let mut after = before.clone();
        let cell = after.cell_mut(&CellKey::new("r2", "c2")).unwrap();
        cell.metadata.values.push(MetadataCandidate::new("Q1", "x", 0.7));
        after.columns.get_mut(&ColumnId::from("c2")).unwrap().reconciliators.insert("wd".into());
        round_trip(&before, &after);
    }

    #[test]
    fn cell_patch_on_missing_row_is_skipped() {
        let before = sample();
        let mut after = before.clone();
        after.cell_mut(&CellKey::new("r1", "c1")).unwrap().label = "x".into();
        let patches = diff(&before, &after);

        let mut target = before.clone();
        target.rows.remove(&RowId::from("r1"));
        assert_eq!(apply(&mut target, &patches), 1);
    }

    #[test]
    fn order_patch_drops_ids_without_records() {
        let before = sample();
        let mut after = before.clone();
        after.rows.remove(&RowId::from("r1"));
        let inverse = diff(&after, &before);

        // r2 disappears outside of history before the inverse is applied
        let mut target = after.clone();
        target.rows.remove(&RowId::from("r2"));
        assert_eq!(apply(&mut target, &inverse), 1);

        assert_eq!(target.rows.all_ids, vec![RowId::from("r1")]);
        assert_eq!(target.rows.len(), target.rows.by_id.len());
        assert_eq!(target.rows.iter().count(), 1);
    }

    #[test]
    fn entity_maps_compare_by_records_and_order() {
        let e = sample();
        let mut reordered = e.clone();
        reordered.columns.all_ids.reverse();
        assert_ne!(e.columns, reordered.columns);
        assert_eq!(e.clone().columns, e.columns);
    }
}
