use annotab_core::{ColumnId, RowId};

use crate::cell::Cell;
use crate::table::{Column, LoadedTable, Row, TableInstance};

/// Two columns (`c1` City, `c2` Country) by two rows (`r1` Rome, `r2` Paris).
pub(crate) fn sample_table() -> LoadedTable {
    let mut table = LoadedTable {
        table: TableInstance {
            name: "cities.csv".into(),
            ..Default::default()
        },
        columns: Default::default(),
        rows: Default::default(),
    };
    for (id, label) in [("c1", "City"), ("c2", "Country")] {
        table.columns.push(ColumnId::from(id), Column::new(id, label));
    }
    for (r, city, country) in [("r1", "Rome", "Italy"), ("r2", "Paris", "France")] {
        let mut row = Row::new(r);
        row.cells.insert(ColumnId::from("c1"), Cell::new(RowId::from(r), city));
        row.cells.insert(ColumnId::from("c2"), Cell::new(RowId::from(r), country));
        table.rows.push(RowId::from(r), row);
    }
    table
}

pub(crate) fn sample_store() -> crate::store::TableStore {
    let mut store = crate::store::TableStore::new();
    store.load_table(sample_table());
    store
}
