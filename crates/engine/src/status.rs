//! Column status policy.
//!
//! One three-tier rule, used by every operation that changes metadata or
//! removes rows:
//! - `Reconciliated`: the column has cells and every one is matched
//! - `Pending`: at least one cell has candidates, but not all are matched
//! - `Empty`: otherwise

use annotab_core::ColumnId;

use crate::table::{ColumnStatus, Entities};

pub fn column_status(entities: &Entities, column: &ColumnId) -> ColumnStatus {
    let mut total = 0usize;
    let mut matched = 0usize;
    let mut with_metadata = 0usize;

    for cell in entities.column_cells(column) {
        total += 1;
        if cell.is_matched() {
            matched += 1;
        }
        if cell.has_metadata() {
            with_metadata += 1;
        }
    }

    if total > 0 && matched == total {
        ColumnStatus::Reconciliated
    } else if with_metadata > 0 {
        ColumnStatus::Pending
    } else {
        ColumnStatus::Empty
    }
}

/// Recompute and store the status of one column. Unknown columns are ignored.
pub fn refresh_column_status(entities: &mut Entities, column: &ColumnId) {
    let status = column_status(entities, column);
    if let Some(col) = entities.columns.get_mut(column) {
        col.status = status;
    }
}

/// Recompute the status of every column.
pub fn refresh_all_statuses(entities: &mut Entities) {
    let ids = entities.columns.all_ids.clone();
    for id in &ids {
        refresh_column_status(entities, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, MetadataCandidate};
    use crate::table::{Column, Row};
    use annotab_core::RowId;

    fn entities(cells: &[(&str, Vec<MetadataCandidate>)]) -> Entities {
        let mut e = Entities::default();
        e.columns.push(ColumnId::from("c1"), Column::new("c1", "City"));
        for (row_id, values) in cells {
            let mut row = Row::new(*row_id);
            let mut cell = Cell::new(RowId::from(*row_id), "x");
            cell.metadata.values = values.clone();
            row.cells.insert(ColumnId::from("c1"), cell);
            e.rows.push(RowId::from(*row_id), row);
        }
        e
    }

    fn matched(id: &str) -> MetadataCandidate {
        let mut m = MetadataCandidate::new(id, id, 1.0);
        m.matched = true;
        m
    }

    #[test]
    fn no_metadata_is_empty() {
        let e = entities(&[("r1", vec![]), ("r2", vec![])]);
        assert_eq!(column_status(&e, &ColumnId::from("c1")), ColumnStatus::Empty);
    }

    #[test]
    fn partial_coverage_is_pending() {
        let e = entities(&[("r1", vec![matched("Q1")]), ("r2", vec![])]);
        assert_eq!(column_status(&e, &ColumnId::from("c1")), ColumnStatus::Pending);

        let e = entities(&[("r1", vec![MetadataCandidate::new("Q1", "a", 0.2)])]);
        assert_eq!(column_status(&e, &ColumnId::from("c1")), ColumnStatus::Pending);
    }

    #[test]
    fn full_coverage_is_reconciliated() {
        let e = entities(&[("r1", vec![matched("Q1")]), ("r2", vec![matched("Q2")])]);
        assert_eq!(column_status(&e, &ColumnId::from("c1")), ColumnStatus::Reconciliated);
    }

    #[test]
    fn column_without_rows_is_empty() {
        let e = entities(&[]);
        assert_eq!(column_status(&e, &ColumnId::from("c1")), ColumnStatus::Empty);
    }
}
