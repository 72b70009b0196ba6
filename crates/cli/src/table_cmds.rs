// Subcommands that read, edit and write table snapshots

use std::fs;
use std::path::Path;

use serde::Serialize;

use annotab_config::Settings;
use annotab_core::ColumnId;
use annotab_engine::{
    ColumnStatus, FileFormat, OpOutcome, ReconciliationBatch, ReconciliatorRef, StoreEvent,
    StoreOp, TableStore, TableType, TableUpdate,
};
use annotab_io::native::SqliteSink;
use annotab_recon::{decode_results, ServiceResultItem};

use crate::CliError;

// ============================================================================
// Snapshot helpers
// ============================================================================

fn open_table(settings: &Settings, path: &Path) -> Result<TableStore, CliError> {
    let loaded = annotab_io::json::read_snapshot(path).map_err(|e| CliError::from_io(path, e))?;
    let mut store = TableStore::with_history_limit(settings.history.limit);
    store.set_matching_threshold(settings.matching.threshold);
    store.load_table(loaded);
    Ok(store)
}

fn write_table(store: &TableStore, path: &Path) -> Result<(), CliError> {
    annotab_io::json::write_snapshot(&store.snapshot(), path).map_err(|e| CliError::from_io(path, e))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| CliError::parse(format!("{}: {e}", path.display())))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::error(format!("failed to encode output: {e}")))?;
    println!("{text}");
    Ok(())
}

// ============================================================================
// import
// ============================================================================

pub fn cmd_import(
    settings: &Settings,
    input: &Path,
    separator: Option<char>,
    name: Option<String>,
    output: &Path,
) -> Result<(), CliError> {
    let separator = separator.or(settings.import.separator);
    let loaded = annotab_io::csv::import(input, separator).map_err(|e| {
        CliError::from_io(input, e).with_hint("pass --separator when the delimiter is not detected")
    })?;
    let file_name = loaded.table.name.clone();

    let mut store = TableStore::with_history_limit(settings.history.limit);
    store.load_table(loaded);
    store.update_current_table(TableUpdate {
        name: Some(name.unwrap_or(file_name)),
        ..TableUpdate::default()
    });
    write_table(&store, output)?;

    eprintln!(
        "imported {} row(s), {} column(s) into {}",
        store.rows().count(),
        store.columns().count(),
        output.display()
    );
    Ok(())
}

// ============================================================================
// inspect
// ============================================================================

#[derive(Serialize)]
struct ColumnSummary<'a> {
    id: &'a ColumnId,
    label: &'a str,
    status: ColumnStatus,
    reconciliators: Vec<&'a str>,
    matched: usize,
    cells: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    name: &'a str,
    format: FileFormat,
    #[serde(rename = "type")]
    kind: TableType,
    rows: usize,
    columns: Vec<ColumnSummary<'a>>,
}

fn status_label(status: ColumnStatus) -> &'static str {
    match status {
        ColumnStatus::Empty => "empty",
        ColumnStatus::Pending => "pending",
        ColumnStatus::Reconciliated => "reconciliated",
    }
}

pub fn cmd_inspect(file: &Path, json: bool) -> Result<(), CliError> {
    let loaded = annotab_io::json::read_snapshot(file).map_err(|e| CliError::from_io(file, e))?;
    let mut store = TableStore::new();
    store.load_table(loaded);

    let columns: Vec<ColumnSummary> = store
        .columns()
        .map(|column| {
            let cells: Vec<_> = store.state().entities.column_cells(&column.id).collect();
            ColumnSummary {
                id: &column.id,
                label: &column.label,
                status: column.status,
                reconciliators: column.reconciliators.iter().map(String::as_str).collect(),
                matched: cells.iter().filter(|c| c.metadata.matched().is_some()).count(),
                cells: cells.len(),
            }
        })
        .collect();
    let table = store.table();
    let summary = TableSummary {
        id: table.id.as_deref(),
        name: &table.name,
        format: table.format,
        kind: table.kind,
        rows: store.rows().count(),
        columns,
    };

    if json {
        return print_json(&summary);
    }

    println!("name:    {}", summary.name);
    if let Some(id) = summary.id {
        println!("id:      {id}");
    }
    println!("rows:    {}", summary.rows);
    println!("columns: {}", summary.columns.len());
    let width = summary.columns.iter().map(|c| c.id.as_str().len()).max().unwrap_or(0);
    for column in &summary.columns {
        println!(
            "  {:<width$}  {:<13}  {}/{} matched  {}",
            column.id.as_str(),
            status_label(column.status),
            column.matched,
            column.cells,
            column.reconciliators.join(", "),
        );
    }
    Ok(())
}

// ============================================================================
// apply
// ============================================================================

pub fn cmd_apply(
    settings: &Settings,
    file: &Path,
    ops_path: &Path,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let mut store = open_table(settings, file)?;
    let ops: Vec<StoreOp> = read_json(ops_path)
        .map_err(|e| e.with_hint("operations are a JSON array of objects tagged by \"op\""))?;

    let total = ops.len();
    for (i, op) in ops.into_iter().enumerate() {
        let name = op.name();
        log::debug!("op #{i}: {name}");
        match store.apply(op, true) {
            Ok(OpOutcome::Nothing(e)) => eprintln!("note: op #{i} ({name}): {e}"),
            Ok(OpOutcome::Merged(report)) if !report.skipped.is_empty() => eprintln!(
                "note: op #{i} ({name}): {} stale cell(s) skipped",
                report.skipped.len()
            ),
            Ok(_) => {}
            Err(e) => {
                return Err(CliError::error(format!("op #{i} ({name}): {e}"))
                    .with_hint("nothing was written; earlier operations are discarded"));
            }
        }
    }

    write_table(&store, output.unwrap_or(file))?;
    println!(
        "applied {total} operation(s); {} step(s) can be undone",
        store.history().pointer()
    );
    Ok(())
}

// ============================================================================
// merge
// ============================================================================

pub fn cmd_merge(
    settings: &Settings,
    file: &Path,
    results: &Path,
    reconciliator: &str,
    name: Option<String>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let mut store = open_table(settings, file)?;
    let items: Vec<ServiceResultItem> = read_json(results)?;
    let items = decode_results(items).map_err(|e| {
        CliError::parse(format!("{}: {e}", results.display()))
            .with_hint("cell ids look like `<row>$<column>`")
    })?;

    let name = name
        .or_else(|| {
            settings
                .services
                .reconciliator(reconciliator)
                .map(|service| service.name.clone())
        })
        .unwrap_or_else(|| reconciliator.to_string());

    let report = store.apply_reconciliation(
        ReconciliationBatch {
            reconciliator: ReconciliatorRef::new(reconciliator, name),
            items,
        },
        true,
    )?;
    for event in store.drain_events() {
        if let StoreEvent::StaleSkipped { key } = event {
            eprintln!("note: {key} no longer exists; skipped");
        }
    }

    write_table(&store, output.unwrap_or(file))?;
    print_json(&report)
}

// ============================================================================
// save / list
// ============================================================================

pub fn cmd_save(settings: &Settings, file: &Path, db: &Path) -> Result<(), CliError> {
    let mut store = open_table(settings, file)?;
    let mut sink = SqliteSink::open(db).map_err(|e| CliError::from_io(db, e))?;

    let id = store.save(&mut sink).map_err(|e| CliError::io(format!("{}: {e}", db.display())))?;
    write_table(&store, file)?;
    println!("{id}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedEntry<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<&'a str>,
}

pub fn cmd_list(db: &Path, json: bool) -> Result<(), CliError> {
    if !db.exists() {
        return Err(CliError::io(format!("{}: no such table store", db.display())));
    }
    let sink = SqliteSink::open(db).map_err(|e| CliError::from_io(db, e))?;
    let tables = sink.list().map_err(|e| CliError::from_io(db, e))?;

    if json {
        let entries: Vec<SavedEntry> = tables
            .iter()
            .map(|t| SavedEntry {
                id: &t.id,
                name: &t.name,
                last_modified: t.last_modified.as_deref(),
            })
            .collect();
        return print_json(&entries);
    }

    for table in &tables {
        println!(
            "{}\t{}\t{}",
            table.id,
            table.name,
            table.last_modified.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
