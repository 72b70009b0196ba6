//! End-to-end store behavior through the public API.

use annotab_core::{CellKey, ColumnId, RowId};
use annotab_engine::{
    Cell, CellUpdate, Column, ColumnStatus, HistoryError, LoadedTable, MetadataCandidate,
    ReconciliationBatch, ReconciliatorRef, Row, StoreOp, TableInstance, TableStore, TableType,
};

fn table(rows: &[(&str, &[&str])], columns: &[&str]) -> LoadedTable {
    let mut loaded = LoadedTable {
        table: TableInstance {
            name: "test".into(),
            kind: TableType::Raw,
            ..Default::default()
        },
        columns: Default::default(),
        rows: Default::default(),
    };
    for c in columns {
        loaded.columns.push(ColumnId::from(*c), Column::new(*c, c.to_uppercase()));
    }
    for (r, labels) in rows {
        let mut row = Row::new(*r);
        for (c, label) in columns.iter().zip(labels.iter()) {
            row.cells.insert(ColumnId::from(*c), Cell::new(RowId::from(*r), *label));
        }
        loaded.rows.push(RowId::from(*r), row);
    }
    loaded
}

fn store_with(loaded: LoadedTable) -> TableStore {
    let mut store = TableStore::new();
    store.load_table(loaded);
    store
}

fn cities() -> TableStore {
    store_with(table(
        &[("r1", &["Rome", "Italy"]), ("r2", &["Paris", "France"]), ("r3", &["Oslo", "Norway"])],
        &["c1", "c2"],
    ))
}

fn key(s: &str) -> CellKey {
    CellKey::parse(s).unwrap()
}

fn candidate(id: &str, score: f64, matched: bool) -> MetadataCandidate {
    let mut m = MetadataCandidate::new(id, id, score);
    m.matched = matched;
    m
}

#[test]
fn undo_all_then_redo_all_round_trips() {
    let mut store = cities();
    let initial = store.state().entities.clone();

    store.update_cell_label(&key("r1$c1"), "Roma", true).unwrap();
    store.delete_row(&RowId::from("r2"), true).unwrap();
    store.delete_column(&ColumnId::from("c2"), true).unwrap();
    store.update_cell_label(&key("r3$c1"), "Kristiania", true).unwrap();
    let last = store.state().entities.clone();

    for _ in 0..4 {
        store.undo().unwrap();
    }
    assert_eq!(store.undo(), Err(HistoryError::NothingToUndo));
    assert_eq!(store.state().entities, initial);

    for _ in 0..4 {
        store.redo().unwrap();
    }
    assert_eq!(store.redo(), Err(HistoryError::NothingToRedo));
    assert_eq!(store.state().entities, last);
}

#[test]
fn new_mutation_after_undo_discards_redo() {
    let mut store = cities();
    store.update_cell_label(&key("r1$c1"), "Roma", true).unwrap();
    store.undo().unwrap();
    assert!(store.can_redo());

    store.update_cell_label(&key("r2$c1"), "Parigi", true).unwrap();
    assert!(!store.can_redo());
    assert_eq!(store.redo(), Err(HistoryError::NothingToRedo));
    assert_eq!(store.cell(&key("r1$c1")).unwrap().label, "Rome");
}

#[test]
fn auto_matching_single_cell_reconciliates_column() {
    let mut store = store_with(table(&[("r1", &["Rome"])], &["c1"]));
    store
        .apply_reconciliation(
            ReconciliationBatch {
                reconciliator: ReconciliatorRef::new("wd", "Wikidata"),
                items: vec![CellUpdate {
                    key: key("r1$c1"),
                    metadata: vec![candidate("Q1", 0.9, false), candidate("Q2", 0.4, false)],
                }],
            },
            true,
        )
        .unwrap();
    assert_eq!(store.column_status(&ColumnId::from("c1")), Some(ColumnStatus::Pending));

    store.select_cell(&key("r1$c1"), false).unwrap();
    store.auto_matching(0.5, true).unwrap();

    let values = &store.cell_metadata(&key("r1$c1")).unwrap().values;
    assert!(values[0].matched);
    assert!(!values[1].matched);
    assert_eq!(
        store.column_status(&ColumnId::from("c1")),
        Some(ColumnStatus::Reconciliated)
    );
}

#[test]
fn same_label_records_nothing() {
    let mut store = cities();
    store.update_cell_editable(&key("r1$c1")).unwrap();
    let could_undo = store.can_undo();

    store.update_cell_label(&key("r1$c1"), "Rome", true).unwrap();

    assert!(!store.cell(&key("r1$c1")).unwrap().editable);
    assert_eq!(store.can_undo(), could_undo);
    assert_eq!(store.history().len(), 0);
}

#[test]
fn delete_column_then_undo_restores_cells_in_place() {
    let mut store = cities();
    let before = store.state().entities.clone();

    store.delete_column(&ColumnId::from("c1"), true).unwrap();
    assert_eq!(store.columns().count(), 1);
    store.undo().unwrap();

    assert_eq!(store.state().entities, before);
    let order: Vec<_> = store.columns().map(|c| c.id.as_str().to_string()).collect();
    assert_eq!(order, vec!["c1", "c2"]);
    assert_eq!(store.cell(&key("r2$c1")).unwrap().label, "Paris");
}

#[test]
fn merge_never_leaves_matched_column_empty() {
    let mut store = cities();
    store
        .apply_reconciliation(
            ReconciliationBatch {
                reconciliator: ReconciliatorRef::new("wd", "Wikidata"),
                items: vec![CellUpdate {
                    key: key("r2$c2"),
                    metadata: vec![candidate("Q142", 1.0, true)],
                }],
            },
            true,
        )
        .unwrap();
    assert_ne!(store.column_status(&ColumnId::from("c2")), Some(ColumnStatus::Empty));
}

#[test]
fn one_stale_key_does_not_block_the_rest() {
    let mut store = cities();
    store.delete_row(&RowId::from("r3"), true).unwrap();

    let items: Vec<CellUpdate> = ["r1$c1", "r2$c1", "r3$c1"]
        .iter()
        .map(|k| CellUpdate {
            key: key(k),
            metadata: vec![candidate("Q", 0.7, true)],
        })
        .collect();
    let report = store
        .apply_reconciliation(
            ReconciliationBatch { reconciliator: ReconciliatorRef::new("wd", "Wikidata"), items },
            true,
        )
        .unwrap();

    assert_eq!(report.merged, 2);
    assert_eq!(report.skipped, vec![key("r3$c1")]);
    assert!(store.cell(&key("r1$c1")).unwrap().is_matched());
    assert!(store.cell(&key("r2$c1")).unwrap().is_matched());
}

#[test]
fn undo_redo_only_touch_modified_date_on_success() {
    let mut store = cities();
    let loaded_at = store.table().last_modified_date;
    assert!(store.undo().is_err());
    assert_eq!(store.table().last_modified_date, loaded_at);

    store.update_cell_label(&key("r1$c1"), "Roma", true).unwrap();
    let edited_at = store.table().last_modified_date;
    store.undo().unwrap();
    assert!(store.table().last_modified_date > edited_at);
}

#[test]
fn redo_of_delete_prunes_selection() {
    let mut store = cities();
    store.delete_row(&RowId::from("r1"), true).unwrap();
    store.undo().unwrap();
    store.select_row(&RowId::from("r1"), false).unwrap();
    store.select_cell(&key("r1$c2"), false).unwrap();

    store.redo().unwrap();
    assert!(!store.is_row_selected(&RowId::from("r1")));
    assert!(store.selected_cells().is_empty());
}

#[test]
fn history_limit_drops_oldest() {
    let mut store = TableStore::with_history_limit(2);
    store.load_table(table(&[("r1", &["a"])], &["c1"]));
    for value in ["b", "c", "d"] {
        store.update_cell_label(&key("r1$c1"), value, true).unwrap();
    }
    store.undo().unwrap();
    store.undo().unwrap();
    assert_eq!(store.undo(), Err(HistoryError::NothingToUndo));
    assert_eq!(store.cell(&key("r1$c1")).unwrap().label, "b");
}

#[test]
fn scripted_ops_match_direct_calls() {
    let ops: Vec<StoreOp> = serde_json::from_str(
        r#"[
            {"op": "select_column", "id": "c2"},
            {"op": "delete_selected"},
            {"op": "update_cell_label", "cell": "r1$c1", "value": "Roma"},
            {"op": "undo"}
        ]"#,
    )
    .unwrap();

    let mut store = cities();
    for op in ops {
        store.apply(op, true).unwrap();
    }
    assert_eq!(store.columns().count(), 1);
    assert_eq!(store.cell(&key("r1$c1")).unwrap().label, "Rome");
    assert!(store.can_redo());
}
