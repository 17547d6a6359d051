//! Shared download workflow used by both the CLI and the dashboard.
//!
//! lookup -> fetch -> normalize -> (fallback) -> filter -> assemble -> export
//!
//! Front-ends only decide what to request and how to present the `RunReport`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::data::datasets::{DatasetPlan, Layout, Member, YOY_PERIODS};
use crate::data::normalize::normalize;
use crate::data::registry::{EURO_AREA_CODES, SECTORS};
use crate::data::{FallbackStore, Fetcher, SeriesRegistry};
use crate::domain::{
    DateRange, FileOutcome, HicpPanel, ObservationSeries, RunReport, SeriesDescriptor, SeriesStatus,
    SeriesTable,
};
use crate::error::SeriesError;
use crate::io::{count_data_rows, read_pivot_counts, read_table_csv, write_frame, CsvFrame, ExportOutcome};

pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// One series after the live/fallback decision, filtered to the requested window.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub descriptor: SeriesDescriptor,
    pub series: ObservationSeries,
    pub status: SeriesStatus,
    pub note: Option<String>,
}

/// A file written during the run, kept for the console preview.
#[derive(Debug, Clone)]
pub struct Preview {
    pub dataset: String,
    pub path: PathBuf,
    pub frame: CsvFrame,
}

#[derive(Debug, Clone)]
pub struct DownloadOutput {
    pub report: RunReport,
    pub previews: Vec<Preview>,
}

pub struct Pipeline<'a, F: Fetcher> {
    registry: SeriesRegistry,
    fetcher: F,
    fallback: &'a FallbackStore,
    retries: u32,
    retry_pause: Duration,
}

impl<'a, F: Fetcher> Pipeline<'a, F> {
    pub fn new(registry: SeriesRegistry, fetcher: F, fallback: &'a FallbackStore) -> Self {
        Self {
            registry,
            fetcher,
            fallback,
            retries: 0,
            retry_pause: DEFAULT_RETRY_PAUSE,
        }
    }

    /// Retry network failures `retries` times, sleeping `pause` in between.
    pub fn with_retries(mut self, retries: u32, pause: Duration) -> Self {
        self.retries = retries;
        self.retry_pause = pause;
        self
    }

    pub fn registry(&self) -> &SeriesRegistry {
        &self.registry
    }

    /// Resolve every member key; nothing is fetched.
    pub fn validate(&self, plans: &[DatasetPlan]) -> Result<(), SeriesError> {
        for member in plans.iter().flat_map(|p| &p.members) {
            self.registry.lookup(&member.key)?;
        }
        Ok(())
    }

    /// Fetch one series, substituting the offline sample on network/parse failure.
    ///
    /// Only an unknown key is an error; every other failure is folded into the
    /// returned status.
    pub fn load(&self, key: &str, range: &DateRange) -> Result<LoadedSeries, SeriesError> {
        let descriptor = self.registry.lookup(key)?;
        Ok(self.load_descriptor(descriptor, range))
    }

    fn load_descriptor(&self, descriptor: SeriesDescriptor, range: &DateRange) -> LoadedSeries {
        let err = match self.fetch_live(&descriptor, range) {
            Ok(series) => {
                let series = series.filter(range);
                tracing::info!(key = %descriptor.key, rows = series.len(), "fetched");
                return LoadedSeries {
                    descriptor,
                    series,
                    status: SeriesStatus::Live,
                    note: None,
                };
            }
            Err(err) => err,
        };

        let sample = err
            .is_fallback_eligible()
            .then(|| self.fallback.get_fallback(&descriptor))
            .flatten();

        match sample {
            Some(sample) => {
                tracing::warn!(key = %descriptor.key, %err, "live fetch failed; using offline sample");
                LoadedSeries {
                    series: sample.filter(range),
                    status: SeriesStatus::Fallback,
                    note: Some(format!("offline sample ({err})")),
                    descriptor,
                }
            }
            None => {
                tracing::warn!(key = %descriptor.key, %err, "live fetch failed; no offline sample");
                LoadedSeries {
                    series: ObservationSeries::default(),
                    status: SeriesStatus::Failed,
                    note: Some(err.to_string()),
                    descriptor,
                }
            }
        }
    }

    fn fetch_live(&self, descriptor: &SeriesDescriptor, range: &DateRange) -> Result<ObservationSeries, SeriesError> {
        let mut attempt = 0;
        loop {
            let result = self
                .fetcher
                .fetch(descriptor, range)
                .and_then(|payload| normalize(&payload));
            match result {
                Err(SeriesError::Network(msg)) if attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(key = %descriptor.key, attempt, %msg, "retrying");
                    thread::sleep(self.retry_pause);
                }
                other => return other,
            }
        }
    }

    /// Run every plan: fetch its series, assemble the table(s), write the file(s).
    ///
    /// Fails only when a key does not resolve; that check runs before any fetch.
    pub fn run_download(
        &self,
        plans: &[DatasetPlan],
        range: &DateRange,
        overwrite: bool,
    ) -> Result<DownloadOutput, SeriesError> {
        self.validate(plans)?;

        let mut report = RunReport::new();
        let mut previews = Vec::new();
        let mut cache: HashMap<(String, DateRange), LoadedSeries> = HashMap::new();

        for plan in plans {
            if !overwrite && plan.outputs().iter().all(|p| p.exists()) {
                tracing::info!(dataset = plan.name(), "outputs exist; skipping (no-overwrite)");
                record_existing(plan, &mut report);
                continue;
            }

            let fetch_range = plan.fetch_range(range);
            let mut loaded: Vec<(&Member, LoadedSeries)> = Vec::with_capacity(plan.members.len());
            for member in &plan.members {
                let descriptor = self.registry.lookup(&member.key)?;
                let cache_key = (descriptor.series_code(), fetch_range);
                let series = match cache.get(&cache_key) {
                    Some(hit) => hit.clone(),
                    None => {
                        let fresh = self.load_descriptor(descriptor, &fetch_range);
                        cache.insert(cache_key, fresh.clone());
                        fresh
                    }
                };
                report.record_series(
                    plan.name(),
                    &member.key,
                    series.status,
                    series.series.filter(range).len(),
                    series.note.clone(),
                );
                loaded.push((member, series));
            }

            if loaded.iter().all(|(_, l)| l.status == SeriesStatus::Failed) {
                for path in plan.outputs() {
                    tracing::warn!(dataset = plan.name(), path = %path.display(), "no data; file not written");
                    report.record_file(plan.name(), path.to_path_buf(), FileOutcome::NoData);
                }
                continue;
            }

            for (path, frame) in assemble_frames(plan, &loaded, range) {
                let outcome = match write_frame(&frame, &path, overwrite) {
                    Ok(ExportOutcome::Written { rows }) => {
                        tracing::info!(dataset = plan.name(), path = %path.display(), rows, "saved");
                        previews.push(Preview {
                            dataset: plan.name().to_string(),
                            path: path.clone(),
                            frame,
                        });
                        FileOutcome::Written { rows }
                    }
                    Ok(ExportOutcome::AlreadyPresent { rows }) => FileOutcome::AlreadyPresent { rows },
                    Err(err) => {
                        tracing::error!(dataset = plan.name(), %err, "export failed");
                        FileOutcome::Failed(err.to_string())
                    }
                };
                report.record_file(plan.name(), path, outcome);
            }
        }

        Ok(DownloadOutput { report, previews })
    }
}

/// Build the output frame(s) for one dataset.
fn assemble_frames(plan: &DatasetPlan, loaded: &[(&Member, LoadedSeries)], range: &DateRange) -> Vec<(PathBuf, CsvFrame)> {
    match &plan.layout {
        Layout::Wide { path } => {
            let table = SeriesTable::from_columns(
                loaded
                    .iter()
                    .map(|(m, l)| (m.column.clone(), l.series.filter(range))),
            );
            vec![(path.clone(), CsvFrame::from_table(&table, plan.precision))]
        }
        Layout::Inflation { path } => {
            let cpi = loaded
                .first()
                .map(|(_, l)| l.series.clone())
                .unwrap_or_default();
            let yoy = cpi.percent_change(YOY_PERIODS);
            let table = SeriesTable::from_columns([
                ("cpi_index", cpi.filter(range)),
                ("cpi_yoy_pct", yoy.filter(range)),
            ]);
            vec![(path.clone(), CsvFrame::from_table(&table, plan.precision))]
        }
        Layout::HicpPanels { by_country, by_sector } => {
            let mut panel = panel_for_catalogue();
            for (member, l) in loaded {
                if let Some((sector, geo)) = &member.cell {
                    panel.add_series(sector, geo, &l.series, range);
                }
            }
            vec![
                (by_country.clone(), CsvFrame::from_pivot(&panel.by_country(), plan.precision)),
                (by_sector.clone(), CsvFrame::from_pivot(&panel.by_sector(), plan.precision)),
            ]
        }
    }
}

/// An empty panel whose columns follow the catalogue order of sectors and geos.
fn panel_for_catalogue() -> HicpPanel {
    HicpPanel::with_order(
        SECTORS.iter().map(|(_, label, _)| label.to_string()).collect(),
        EURO_AREA_CODES.iter().map(|geo| geo.to_string()).collect(),
    )
}

/// Fill the report for a dataset whose outputs are already on disk.
fn record_existing(plan: &DatasetPlan, report: &mut RunReport) {
    for path in plan.outputs() {
        let rows = count_data_rows(path).unwrap_or_else(|err| {
            tracing::warn!(%err, "could not read existing output");
            0
        });
        report.record_file(plan.name(), path.to_path_buf(), FileOutcome::AlreadyPresent { rows });
    }

    if let Layout::HicpPanels { by_country, .. } = &plan.layout {
        let counts = read_pivot_counts(by_country).unwrap_or_else(|err| {
            tracing::warn!(%err, "could not read existing panel");
            HashMap::new()
        });
        for member in &plan.members {
            let rows = member
                .cell
                .as_ref()
                .and_then(|(sector, geo)| counts.get(&(geo.clone(), sector.clone())))
                .copied()
                .unwrap_or(0);
            report.record_series(plan.name(), &member.key, SeriesStatus::AlreadyPresent, rows, None);
        }
        return;
    }

    let table = match &plan.layout {
        Layout::Wide { path } | Layout::Inflation { path } => read_table_csv(path).ok(),
        Layout::HicpPanels { .. } => None,
    };
    for member in &plan.members {
        let column = match plan.layout {
            Layout::Inflation { .. } => "cpi_index",
            _ => member.column.as_str(),
        };
        let rows = table
            .as_ref()
            .and_then(|t| t.column(column))
            .map(|s| s.present_count())
            .unwrap_or(0);
        report.record_series(plan.name(), &member.key, SeriesStatus::AlreadyPresent, rows, None);
    }
}
