//! Formatted terminal output: run header, per-file previews, run summary and
//! the registry listing.
//!
//! Formatting stays here so the pipeline only produces data.

use crate::app::pipeline::Preview;
use crate::data::SeriesRegistry;
use crate::domain::{DateRange, FileOutcome, RunReport, SeriesStatus};

/// One-paragraph description of what is about to run.
pub fn format_run_header(range: &DateRange, registry: &SeriesRegistry, fred_api_key: bool) -> String {
    let mut out = String::new();
    out.push_str("=== econ - macro series download ===\n");
    out.push_str(&format!(
        "Range: {} .. {}\n",
        range.start.map(|d| d.to_string()).unwrap_or_else(|| "(open)".to_string()),
        range.end.map(|d| d.to_string()).unwrap_or_else(|| "(open)".to_string()),
    ));
    out.push_str(&format!("HICP measure: {}\n", registry.measure().code()));
    out.push_str(&format!(
        "FRED access: {}\n",
        if fred_api_key { "API (key configured)" } else { "fredgraph.csv (no key)" }
    ));
    out
}

/// `Saved -> path` followed by the last `rows` rows of the file.
pub fn format_preview(preview: &Preview, rows: usize) -> String {
    let mut out = format!(
        "Saved {} -> {} ({} rows)\n",
        preview.dataset,
        preview.path.display(),
        preview.frame.len()
    );
    if rows == 0 || preview.frame.is_empty() {
        return out;
    }

    let tail = preview.frame.tail(rows);
    let widths: Vec<usize> = preview
        .frame
        .header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            tail.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    out.push_str(&line(&preview.frame.header));
    out.push('\n');
    for row in tail {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Counts per status, one line per file, then warnings.
pub fn format_run_summary(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Series: {} live, {} fallback, {} failed, {} already present\n",
        report.count(SeriesStatus::Live),
        report.count(SeriesStatus::Fallback),
        report.count(SeriesStatus::Failed),
        report.count(SeriesStatus::AlreadyPresent),
    ));

    if !report.files.is_empty() {
        out.push_str("\nFiles:\n");
    }
    for file in &report.files {
        let what = match &file.outcome {
            FileOutcome::Written { rows } => format!("written ({rows} rows)"),
            FileOutcome::AlreadyPresent { rows } => format!("already present ({rows} rows), skipped"),
            FileOutcome::NoData => "no data, not written".to_string(),
            FileOutcome::Failed(msg) => format!("FAILED: {msg}"),
        };
        out.push_str(&format!("  {:<12} {} {what}\n", file.dataset, file.path.display()));
    }

    let warnings: Vec<_> = report.warnings().collect();
    if !warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in warnings {
            out.push_str(&format!(
                "  [{}] {}/{}: {}\n",
                w.status.label(),
                w.dataset,
                w.key,
                w.note.as_deref().unwrap_or("")
            ));
        }
    }

    out
}

/// Every registry key with its source, provider code and name.
pub fn format_series_list(registry: &SeriesRegistry) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<26} {:<6} {:<36} {}\n", "key", "source", "code", "name"));
    out.push_str(&format!("{:-<26} {:-<6} {:-<36} {:-<4}\n", "", "", "", ""));
    for key in registry.keys() {
        let Ok(d) = registry.lookup(&key) else {
            continue;
        };
        out.push_str(
            format!(
                "{:<26} {:<6} {:<36} {}",
                d.key,
                d.source.display_name(),
                d.series_code(),
                d.display_name
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::io::CsvFrame;

    #[test]
    fn summary_lists_files_and_warnings() {
        let mut report = RunReport::new();
        report.record_series("euribor", "euribor_3m", SeriesStatus::Fallback, 3, Some("offline sample".into()));
        report.record_series("euribor", "euribor_6m", SeriesStatus::Live, 3, None);
        report.record_file("euribor", PathBuf::from("data/e.csv"), FileOutcome::Written { rows: 3 });

        let text = format_run_summary(&report);
        assert!(text.starts_with("Series: 1 live, 1 fallback, 0 failed, 0 already present\n"));
        assert!(text.contains("data/e.csv written (3 rows)"));
        assert!(text.contains("[fallback] euribor/euribor_3m: offline sample"));
        assert!(!text.contains("euribor_6m"));
    }

    #[test]
    fn preview_shows_only_the_tail() {
        let frame = CsvFrame {
            header: vec!["date".into(), "USD".into()],
            rows: (1..=9)
                .map(|d| vec![format!("2024-01-0{d}"), "1.080000".into()])
                .collect(),
        };
        let preview = Preview {
            dataset: "fx".into(),
            path: PathBuf::from("fx.csv"),
            frame,
        };
        let text = format_preview(&preview, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Saved fx -> fx.csv (9 rows)");
        assert!(lines[3].contains("2024-01-09"));
        assert_eq!(format_preview(&preview, 0).lines().count(), 1);
    }

    #[test]
    fn series_list_covers_every_key() {
        let registry = SeriesRegistry::default();
        let text = format_series_list(&registry);
        assert_eq!(text.lines().count(), registry.keys().len() + 2);
        assert!(text.contains("FEDFUNDS"));
        assert!(text.contains("EXR.D.USD.EUR.SP00.A"));
    }
}
