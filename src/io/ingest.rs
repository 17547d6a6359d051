//! Read previously exported CSV files back.
//!
//! Used for `--no-overwrite` row counts and for reloading wide tables.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;

use crate::data::normalize::parse_value;
use crate::domain::SeriesTable;
use crate::error::SeriesError;

/// Number of data rows (header excluded) in a CSV file.
pub fn count_data_rows(path: &Path) -> Result<usize, SeriesError> {
    let file = File::open(path).map_err(|e| SeriesError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let mut rows = 0;
    for record in reader.records() {
        record.map_err(|e| SeriesError::io(path, e))?;
        rows += 1;
    }
    Ok(rows)
}

/// Load a wide `date,<col>...` table.
///
/// Rows whose date does not parse are skipped with a warning.
pub fn read_table_csv(path: &Path) -> Result<SeriesTable, SeriesError> {
    let file = File::open(path).map_err(|e| SeriesError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| SeriesError::io(path, e))?.clone();
    let mut columns = headers.iter().map(str::to_string);
    match columns.next() {
        Some(first) if first.trim_start_matches('\u{feff}').eq_ignore_ascii_case("date") => {}
        _ => {
            return Err(SeriesError::Parse(format!(
                "'{}' does not start with a date column",
                path.display()
            )));
        }
    }

    let mut table = SeriesTable::with_columns(columns.collect());
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| SeriesError::io(path, e))?;
        let raw_date = record.get(0).unwrap_or("");
        let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
            tracing::warn!(path = %path.display(), line = line + 2, raw_date, "skipping row with bad date");
            continue;
        };
        let cells = record.iter().skip(1).map(parse_value).collect();
        table.push_row(date, cells);
    }
    Ok(table)
}

/// Present-cell counts of a `date,<index>,<col>...` pivot, keyed by (index, column).
pub fn read_pivot_counts(path: &Path) -> Result<HashMap<(String, String), usize>, SeriesError> {
    let file = File::open(path).map_err(|e| SeriesError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| SeriesError::io(path, e))?.clone();
    if headers.len() < 2 {
        return Err(SeriesError::Parse(format!("'{}' is not a pivot table", path.display())));
    }
    let columns: Vec<&str> = headers.iter().skip(2).collect();

    let mut counts = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| SeriesError::io(path, e))?;
        let index = record.get(1).unwrap_or("");
        for (column, cell) in columns.iter().zip(record.iter().skip(2)) {
            if parse_value(cell).is_some() {
                *counts.entry((index.to_string(), column.to_string())).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rows_of_pivot_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        std::fs::write(&path, "date,country,ALL_ITEMS\n2024-01-01,DE,3.1\n2024-01-01,U2,2.8\n").unwrap();
        assert_eq!(count_data_rows(&path).unwrap(), 2);
    }

    #[test]
    fn read_table_skips_bad_dates_and_keeps_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "date,a,b\n2024-01-01,1.5,\nnot-a-date,9,9\n2024-02-01,,2\n").unwrap();
        let table = read_table_csv(&path).unwrap();
        assert_eq!(table.columns(), ["a".to_string(), "b".to_string()]);
        let rows: Vec<_> = table.rows().map(|(_, c)| c.clone()).collect();
        assert_eq!(rows, vec![vec![Some(1.5), None], vec![None, Some(2.0)]]);
    }

    #[test]
    fn pivot_counts_are_per_index_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        std::fs::write(
            &path,
            "date,country,ALL_ITEMS,ENERGY\n2024-01-01,DE,3.1,\n2024-01-01,U2,2.8,-6.3\n2024-02-01,U2,2.6,-5.0\n",
        )
        .unwrap();
        let counts = read_pivot_counts(&path).unwrap();
        let get = |geo: &str, sector: &str| counts.get(&(geo.to_string(), sector.to_string())).copied();
        assert_eq!(get("U2", "ALL_ITEMS"), Some(2));
        assert_eq!(get("U2", "ENERGY"), Some(2));
        assert_eq!(get("DE", "ALL_ITEMS"), Some(1));
        assert_eq!(get("DE", "ENERGY"), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_table_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, SeriesError::Io { .. }));
        let msg = err.to_string();
        assert!(msg.starts_with("I/O error on '/definitely/not/here.csv'"), "{msg}");
    }
}
