// JSON table snapshots

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use annotab_engine::{LoadedTable, TableSnapshot};

use crate::IoError;

/// Write a table snapshot as pretty-printed JSON.
pub fn write_snapshot(snapshot: &TableSnapshot, path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<LoadedTable, IoError> {
    let file = File::open(path)?;
    let table = serde_json::from_reader(BufReader::new(file))?;
    Ok(table)
}
