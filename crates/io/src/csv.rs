// CSV/TSV import into normalized table entities

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use annotab_core::{ColumnId, RowId};
use annotab_engine::{Cell, Column, FileFormat, LoadedTable, Row, TableInstance, TableType};

use crate::IoError;

/// Import a delimited file. The separator is sniffed when not given.
pub fn import(path: &Path, separator: Option<char>) -> Result<LoadedTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let mut loaded = convert_from_csv(&content, separator)?;
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        loaded.table.name = name.to_string();
    }
    Ok(loaded)
}

/// Convert delimited text to a raw table.
///
/// The first record is the header: each field becomes a column whose id is
/// derived from its label and made unique. Every following record becomes
/// a row `r{n}` (0-based) with one cell per column; short records are
/// padded with empty cells and extra fields are dropped.
pub fn convert_from_csv(content: &str, separator: Option<char>) -> Result<LoadedTable, IoError> {
    let delimiter = match separator {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => return Err(IoError::Invalid(format!("separator must be ASCII, got '{c}'"))),
        None => sniff_delimiter(content),
    };

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(IoError::Invalid("empty file: no header row".into())),
    };

    let mut loaded = LoadedTable {
        table: TableInstance {
            format: FileFormat::Csv,
            kind: TableType::Raw,
            ..Default::default()
        },
        columns: Default::default(),
        rows: Default::default(),
    };

    let mut seen = HashSet::new();
    let mut column_ids = Vec::with_capacity(header.len());
    for (idx, label) in header.iter().enumerate() {
        let label = label.trim();
        let id = unique_column_id(label, idx, &mut seen);
        loaded.columns.push(id.clone(), Column::new(id.clone(), label));
        column_ids.push(id);
    }

    for (n, result) in records.enumerate() {
        let record = result?;
        if record.len() > column_ids.len() {
            log::warn!(
                "row {n}: {} field(s) beyond the header dropped",
                record.len() - column_ids.len()
            );
        }
        let row_id = RowId::from(format!("r{n}"));
        let mut row = Row::new(row_id.clone());
        for (idx, column) in column_ids.iter().enumerate() {
            let label = record.get(idx).unwrap_or("");
            row.cells.insert(column.clone(), Cell::new(row_id.clone(), label));
        }
        loaded.rows.push(row_id, row);
    }

    Ok(loaded)
}

/// Column id from a header label: `$` (the cell-key separator) and
/// whitespace become `_`, blanks become `column_{n}`, repeats get a numeric
/// suffix.
fn unique_column_id(label: &str, idx: usize, seen: &mut HashSet<String>) -> ColumnId {
    let base: String = label
        .chars()
        .map(|c| if c == '$' || c.is_whitespace() { '_' } else { c })
        .collect();
    let base = if base.is_empty() { format!("column_{}", idx + 1) } else { base };

    let mut candidate = base.clone();
    let mut suffix = 2;
    while !seen.insert(candidate.clone()) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    ColumnId::from(candidate)
}

const CANDIDATE_SEPARATORS: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_RECORDS: usize = 10;

/// Pick the separator whose parse of the first records gives a multi-field
/// header that most following records agree with. Comma when nothing fits.
fn sniff_delimiter(content: &str) -> u8 {
    let mut best = (b',', 0usize);
    for delimiter in CANDIDATE_SEPARATORS {
        let widths = record_widths(content, delimiter);
        let Some(&header) = widths.first() else {
            continue;
        };
        if header < 2 {
            continue;
        }
        let agreeing = widths.iter().filter(|&&w| w == header).count();
        let score = agreeing * header;
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

/// Field counts of the leading records, stopping at the first unparsable one.
fn record_widths(content: &str, delimiter: u8) -> Vec<usize> {
    ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
        .records()
        .take(SNIFF_RECORDS)
        .map_while(Result::ok)
        .map(|record| record.len())
        .collect()
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Spreadsheet exports are often Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotab_core::CellKey;
    use std::fs;
    use tempfile::tempdir;

    fn label(table: &LoadedTable, row: &str, col: &str) -> String {
        let key = CellKey::new(row, col);
        table.rows.get(&key.row).unwrap().cells.get(&key.column).unwrap().label.clone()
    }

    #[test]
    fn sniffs_each_candidate_separator() {
        let cases = [
            ("City;Country\nRome;Italy\nParis;France\n", b';'),
            ("City,Country\nRome,Italy\n", b','),
            ("City\tCountry\nRome\tItaly\n", b'\t'),
            ("City|Country\nRome|Italy\n", b'|'),
        ];
        for (content, expected) in cases {
            assert_eq!(sniff_delimiter(content), expected, "{content:?}");
        }
    }

    #[test]
    fn quoted_commas_do_not_fool_the_sniffer() {
        let content = "Name;Address;City\n\"Rossi, Anna\";\"Via Roma 1, int 4\";Rome\nLuca;\"Via Po 2\";Turin\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn quoted_newlines_count_as_one_record() {
        let content = "a,b\n\"line one\nline two\",x\n1,2\n";
        assert_eq!(record_widths(content, b','), vec![2, 2, 2]);
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn single_column_falls_back_to_comma() {
        assert_eq!(sniff_delimiter("City\nRome\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn converts_header_and_rows() {
        let table = convert_from_csv("City,Country\nRome,Italy\nParis,France\n", None).unwrap();

        assert_eq!(table.table.kind, TableType::Raw);
        assert_eq!(table.table.format, FileFormat::Csv);
        assert_eq!(table.columns.all_ids, vec![ColumnId::from("City"), ColumnId::from("Country")]);
        assert_eq!(table.rows.all_ids, vec![RowId::from("r0"), RowId::from("r1")]);
        assert_eq!(label(&table, "r1", "Country"), "France");
        assert_eq!(table.rows.get(&RowId::from("r0")).unwrap().cells.len(), 2);
    }

    #[test]
    fn column_ids_are_unique_and_key_safe() {
        let table = convert_from_csv("a,a,,price $,a\n1,2,3,4,5\n", Some(',')).unwrap();
        let ids: Vec<&str> = table.columns.all_ids.iter().map(|c| c.as_str()).collect();
        assert_eq!(ids, vec!["a", "a_2", "column_3", "price__", "a_3"]);
        assert_eq!(table.columns.get(&ColumnId::from("price__")).unwrap().label, "price $");
        assert!(ids.iter().all(|id| !id.contains('$')));
    }

    #[test]
    fn short_records_are_padded() {
        let table = convert_from_csv("a;b;c\n1\n", Some(';')).unwrap();
        assert_eq!(label(&table, "r0", "a"), "1");
        assert_eq!(label(&table, "r0", "c"), "");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(convert_from_csv("", None), Err(IoError::Invalid(_))));
        assert!(matches!(convert_from_csv("a", Some('é')), Err(IoError::Invalid(_))));
    }

    #[test]
    fn test_semicolon_csv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cities.csv");
        fs::write(&path, "Name;Age;City\nAlice;30;Paris\nBob;25;London\n").unwrap();

        let table = import(&path, None).unwrap();
        assert_eq!(table.table.name, "cities.csv");
        assert_eq!(label(&table, "r0", "City"), "Paris");
        assert_eq!(label(&table, "r1", "Name"), "Bob");
    }

    #[test]
    fn windows_1252_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Café" with 0xE9
        fs::write(&path, b"Name,City\nCaf\xe9,Paris\n").unwrap();

        let table = import(&path, None).unwrap();
        assert_eq!(label(&table, "r0", "Name"), "Café");
    }
}
