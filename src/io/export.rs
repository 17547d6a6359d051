//! Write dataset tables to CSV.
//!
//! Every output is a `CsvFrame` (header + already formatted cells), so wide
//! tables and HICP pivots share one writer. Missing values are empty cells.

use std::fs;
use std::path::Path;

use crate::domain::{PivotTable, SeriesTable};
use crate::error::SeriesError;
use crate::io::ingest::count_data_rows;

/// Result of a successful export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { rows: usize },
    /// The file existed and overwriting was off; `rows` is read back from it.
    AlreadyPresent { rows: usize },
}

/// Header plus rendered rows, ready to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvFrame {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvFrame {
    /// `date` + one column per table column.
    pub fn from_table(table: &SeriesTable, precision: usize) -> Self {
        let mut header = vec!["date".to_string()];
        header.extend(table.columns().iter().cloned());
        let rows = table
            .rows()
            .map(|(date, cells)| {
                let mut row = Vec::with_capacity(cells.len() + 1);
                row.push(date.to_string());
                row.extend(cells.iter().map(|v| format_value(*v, precision)));
                row
            })
            .collect();
        Self { header, rows }
    }

    /// `date` + index column + one column per pivot column.
    pub fn from_pivot(pivot: &PivotTable, precision: usize) -> Self {
        let mut header = vec!["date".to_string(), pivot.index_label.clone()];
        header.extend(pivot.columns.iter().cloned());
        let rows = pivot
            .rows
            .iter()
            .map(|r| {
                let mut row = Vec::with_capacity(r.cells.len() + 2);
                row.push(r.date.to_string());
                row.push(r.index.clone());
                row.extend(r.cells.iter().map(|v| format_value(*v, precision)));
                row
            })
            .collect();
        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Last `n` rows (for console previews).
    pub fn tail(&self, n: usize) -> &[Vec<String>] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

pub fn format_value(value: Option<f64>, precision: usize) -> String {
    value.map(|v| format!("{v:.precision$}")).unwrap_or_default()
}

/// Export a wide table.
pub fn export_table(
    table: &SeriesTable,
    path: &Path,
    precision: usize,
    overwrite: bool,
) -> Result<ExportOutcome, SeriesError> {
    write_frame(&CsvFrame::from_table(table, precision), path, overwrite)
}

/// Write a frame to `path`, creating parent directories.
///
/// With `overwrite == false` an existing file is left untouched.
pub fn write_frame(frame: &CsvFrame, path: &Path, overwrite: bool) -> Result<ExportOutcome, SeriesError> {
    if !overwrite && path.exists() {
        let rows = count_data_rows(path)?;
        return Ok(ExportOutcome::AlreadyPresent { rows });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SeriesError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| SeriesError::io(path, e))?;
    writer
        .write_record(&frame.header)
        .map_err(|e| SeriesError::io(path, e))?;
    for row in &frame.rows {
        writer.write_record(row).map_err(|e| SeriesError::io(path, e))?;
    }
    writer.flush().map_err(|e| SeriesError::io(path, e))?;

    Ok(ExportOutcome::Written { rows: frame.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, ObservationSeries};
    use crate::io::ingest::read_table_csv;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table() -> SeriesTable {
        let a = ObservationSeries::from_observations(vec![
            Observation::new(d(2024, 1, 1), Some(3.9251)),
            Observation::new(d(2024, 2, 1), None),
            Observation::new(d(2024, 3, 1), Some(3.8)),
        ]);
        let b = ObservationSeries::from_observations(vec![Observation::new(d(2024, 3, 1), Some(1.0))]);
        SeriesTable::from_columns([("euribor_3m", a), ("euribor_6m", b)])
    }

    #[test]
    fn frame_renders_missing_as_empty_and_fixed_decimals() {
        let frame = CsvFrame::from_table(&table(), 4);
        assert_eq!(frame.header, ["date", "euribor_3m", "euribor_6m"]);
        assert_eq!(frame.rows[0], ["2024-01-01", "3.9251", ""]);
        assert_eq!(frame.rows[1], ["2024-02-01", "", ""]);
        assert_eq!(frame.rows[2], ["2024-03-01", "3.8000", "1.0000"]);
        assert_eq!(frame.tail(2).len(), 2);
        assert_eq!(frame.tail(10).len(), 3);
    }

    #[test]
    fn export_then_read_back_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("euribor.csv");
        let outcome = export_table(&table(), &path, 6, true).unwrap();
        assert_eq!(outcome, ExportOutcome::Written { rows: 3 });

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date,euribor_3m,euribor_6m\n2024-01-01,3.925100,\n"));

        let back = read_table_csv(&path).unwrap();
        assert_eq!(back, table());
    }

    #[test]
    fn no_overwrite_leaves_file_and_reports_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "date,x\n2020-01-01,1\n2020-02-01,2\n").unwrap();

        let outcome = export_table(&table(), &path, 6, false).unwrap();
        assert_eq!(outcome, ExportOutcome::AlreadyPresent { rows: 2 });
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "date,x\n2020-01-01,1\n2020-02-01,2\n"
        );
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = export_table(&table(), &blocker.join("out.csv"), 6, true).unwrap_err();
        assert!(matches!(err, SeriesError::Io { .. }), "{err:?}");
    }
}
