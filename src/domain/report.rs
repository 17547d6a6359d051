//! Per-run outcome record.
//!
//! The orchestrator appends one `SeriesReport` per (dataset, series) pair and
//! one `FileReport` per output file. Nothing else mutates it.

use std::path::PathBuf;

/// How a series ended up in (or out of) the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStatus {
    /// Fetched and parsed from the live API.
    Live,
    /// Served from the bundled offline sample.
    Fallback,
    /// Neither live data nor a sample was available.
    Failed,
    /// Output already on disk and `--no-overwrite` was set; nothing fetched.
    AlreadyPresent,
}

impl SeriesStatus {
    pub fn label(self) -> &'static str {
        match self {
            SeriesStatus::Live => "live",
            SeriesStatus::Fallback => "fallback",
            SeriesStatus::Failed => "failed",
            SeriesStatus::AlreadyPresent => "already present",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReport {
    pub dataset: String,
    pub key: String,
    pub status: SeriesStatus,
    pub row_count: usize,
    /// Reason for a fallback/failure.
    pub note: Option<String>,
}

/// What happened to one output file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Written { rows: usize },
    AlreadyPresent { rows: usize },
    /// Every series failed; nothing to write.
    NoData,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub dataset: String,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub series: Vec<SeriesReport>,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_series(
        &mut self,
        dataset: &str,
        key: &str,
        status: SeriesStatus,
        row_count: usize,
        note: Option<String>,
    ) {
        self.series.push(SeriesReport {
            dataset: dataset.to_string(),
            key: key.to_string(),
            status,
            row_count,
            note,
        });
    }

    pub fn record_file(&mut self, dataset: &str, path: PathBuf, outcome: FileOutcome) {
        self.files.push(FileReport {
            dataset: dataset.to_string(),
            path,
            outcome,
        });
    }

    /// First entry recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&SeriesReport> {
        self.series.iter().find(|s| s.key == key)
    }

    pub fn count(&self, status: SeriesStatus) -> usize {
        self.series.iter().filter(|s| s.status == status).count()
    }

    /// Entries that deserve a warning line (fallback or failed).
    pub fn warnings(&self) -> impl Iterator<Item = &SeriesReport> {
        self.series
            .iter()
            .filter(|s| matches!(s.status, SeriesStatus::Fallback | SeriesStatus::Failed))
    }
}
