//! Shared domain types.
//!
//! Series are kept as plain sorted vectors of `(date, Option<f64>)`. A `None`
//! value is the explicit "missing" marker: sources publish gaps (FRED's `"."`,
//! SDMX `null`) and we carry them through to the CSV as empty cells rather
//! than dropping rows.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use clap::ValueEnum;

/// Upstream data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Fred,
    Ecb,
}

impl Source {
    pub fn display_name(self) -> &'static str {
        match self {
            Source::Fred => "FRED",
            Source::Ecb => "ECB",
        }
    }
}

/// Native observation frequency of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Monthly,
}

/// HICP measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Measure {
    /// Annual rate of change (% YoY).
    #[value(name = "ANR")]
    Anr,
    /// Index level (2015 = 100).
    #[value(name = "INX")]
    Inx,
}

impl Measure {
    pub fn code(self) -> &'static str {
        match self {
            Measure::Anr => "ANR",
            Measure::Inx => "INX",
        }
    }
}

/// Which group of datasets a download run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum RunGroup {
    Euribor,
    Fx,
    HicpAgg,
    HicpSector,
    UsInflation,
    UsRates,
    /// `us_inflation` + `us_rates`.
    Us,
    /// Every dataset.
    All,
}

/// One output dataset (a CSV file, or a pair of pivots for HICP sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    UsInflation,
    UsRates,
    Euribor,
    Fx,
    HicpAgg,
    HicpSector,
}

impl DatasetKind {
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::UsInflation => "us_inflation",
            DatasetKind::UsRates => "us_rates",
            DatasetKind::Euribor => "euribor",
            DatasetKind::Fx => "fx",
            DatasetKind::HicpAgg => "hicp_agg",
            DatasetKind::HicpSector => "hicp_sector",
        }
    }
}

impl RunGroup {
    pub fn datasets(self) -> Vec<DatasetKind> {
        match self {
            RunGroup::Euribor => vec![DatasetKind::Euribor],
            RunGroup::Fx => vec![DatasetKind::Fx],
            RunGroup::HicpAgg => vec![DatasetKind::HicpAgg],
            RunGroup::HicpSector => vec![DatasetKind::HicpSector],
            RunGroup::UsInflation => vec![DatasetKind::UsInflation],
            RunGroup::UsRates => vec![DatasetKind::UsRates],
            RunGroup::Us => vec![DatasetKind::UsInflation, DatasetKind::UsRates],
            RunGroup::All => vec![
                DatasetKind::UsInflation,
                DatasetKind::UsRates,
                DatasetKind::Euribor,
                DatasetKind::Fx,
                DatasetKind::HicpAgg,
                DatasetKind::HicpSector,
            ],
        }
    }
}

/// Source-specific request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// FRED series id, e.g. `CPIAUCSL`.
    Fred { series_id: String },
    /// ECB dataflow + series key, e.g. `FM` / `M.U2.EUR.RT.MM.EURIBOR3MD_.HSTA`.
    Ecb { flow: String, key: String },
}

/// Everything needed to request and label one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDescriptor {
    pub key: String,
    pub source: Source,
    pub endpoint: Endpoint,
    pub frequency: Frequency,
    pub display_name: String,
}

impl SeriesDescriptor {
    /// The provider's own identifier for the series (`FEDFUNDS`, `ICP.M.U2.N.000000.4.ANR`).
    pub fn series_code(&self) -> String {
        match &self.endpoint {
            Endpoint::Fred { series_id } => series_id.clone(),
            Endpoint::Ecb { flow, key } => format!("{flow}.{key}"),
        }
    }
}

/// A single dated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Ascending, date-unique sequence of observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSeries {
    points: Vec<Observation>,
}

impl ObservationSeries {
    /// Build a series from observations in any order.
    ///
    /// Sorting is stable, so when a date repeats the last occurrence wins.
    pub fn from_observations(mut points: Vec<Observation>) -> Self {
        points.sort_by_key(|o| o.date);
        let mut out: Vec<Observation> = Vec::with_capacity(points.len());
        for obs in points {
            match out.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => out.push(obs),
            }
        }
        Self { points: out }
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Earliest observation date (test-only accessor).
    #[cfg(test)]
    pub(crate) fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|o| o.date)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of observations carrying a value.
    pub fn present_count(&self) -> usize {
        self.points.iter().filter(|o| o.value.is_some()).count()
    }

    /// Keep the observations inside `range` (inclusive).
    pub fn filter(&self, range: &DateRange) -> ObservationSeries {
        ObservationSeries {
            points: self
                .points
                .iter()
                .filter(|o| range.contains(o.date))
                .copied()
                .collect(),
        }
    }

    /// Percent change versus the observation `periods` positions earlier (× 100).
    ///
    /// Positions without a comparable earlier value (series start, missing
    /// values, zero base) are missing.
    pub fn percent_change(&self, periods: usize) -> ObservationSeries {
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, obs)| {
                let value = i
                    .checked_sub(periods)
                    .and_then(|j| self.points[j].value)
                    .zip(obs.value)
                    .and_then(|(base, cur)| {
                        if base == 0.0 {
                            None
                        } else {
                            Some((cur / base - 1.0) * 100.0)
                        }
                    });
                Observation::new(obs.date, value)
            })
            .collect();
        ObservationSeries { points }
    }
}

/// Inclusive date window; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, String> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(format!("Start date {s} is after end date {e}."));
            }
        }
        Ok(Self { start, end })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    /// Same window with the start moved back by `months` (open starts stay open).
    pub fn extend_back(&self, months: u32) -> DateRange {
        DateRange {
            start: self
                .start
                .map(|s| s.checked_sub_months(Months::new(months)).unwrap_or(s)),
            end: self.end,
        }
    }
}

/// Several series outer-joined on their dates.
///
/// Column order is insertion order; each row holds one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    columns: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ObservationSeries)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, series) in columns {
            table.add_column(name, &series);
        }
        table
    }

    /// Append a column, extending the date axis as needed.
    pub fn add_column(&mut self, name: impl Into<String>, series: &ObservationSeries) {
        let width = self.columns.len();
        self.columns.push(name.into());
        for row in self.rows.values_mut() {
            row.push(None);
        }
        for obs in series.points() {
            let row = self.rows.entry(obs.date).or_insert_with(|| vec![None; width + 1]);
            row[width] = obs.value;
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<Option<f64>>)> {
        self.rows.iter()
    }

    /// Insert a full row (used when reading tables back from CSV).
    pub fn push_row(&mut self, date: NaiveDate, mut cells: Vec<Option<f64>>) {
        cells.resize(self.columns.len(), None);
        self.rows.insert(date, cells);
    }

    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Extract one column as a series (rows where the column is absent are kept as missing).
    pub fn column(&self, name: &str) -> Option<ObservationSeries> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(ObservationSeries::from_observations(
            self.rows
                .iter()
                .map(|(date, cells)| Observation::new(*date, cells.get(idx).copied().flatten()))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_observations_sorts_and_keeps_last_duplicate() {
        let s = ObservationSeries::from_observations(vec![
            Observation::new(d(2024, 2, 1), Some(2.0)),
            Observation::new(d(2024, 1, 1), Some(1.0)),
            Observation::new(d(2024, 2, 1), Some(3.0)),
        ]);
        let dates: Vec<_> = s.points().iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 2, 1)]);
        assert_eq!(s.points()[1].value, Some(3.0));
    }

    #[test]
    fn filter_is_inclusive_and_keeps_missing() {
        let s = ObservationSeries::from_observations(vec![
            Observation::new(d(2024, 1, 1), Some(1.0)),
            Observation::new(d(2024, 2, 1), None),
            Observation::new(d(2024, 3, 1), Some(3.0)),
            Observation::new(d(2024, 4, 1), Some(4.0)),
        ]);
        let range = DateRange::new(Some(d(2024, 2, 1)), Some(d(2024, 3, 1))).unwrap();
        let out = s.filter(&range);
        assert_eq!(out.len(), 2);
        assert_eq!(out.points()[0], Observation::new(d(2024, 2, 1), None));
        assert_eq!(out.filter(&range), out);

        assert_eq!(s.filter(&DateRange::unbounded()), s);
        let past = DateRange::new(None, Some(d(2000, 1, 1))).unwrap();
        assert!(s.filter(&past).is_empty());
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(Some(d(2024, 2, 1)), Some(d(2024, 1, 1))).is_err());
    }

    #[test]
    fn extend_back_moves_start_only() {
        let r = DateRange::new(Some(d(2024, 1, 31)), Some(d(2024, 6, 30))).unwrap();
        let wider = r.extend_back(12);
        assert_eq!(wider.start, Some(d(2023, 1, 31)));
        assert_eq!(wider.end, r.end);
        assert_eq!(DateRange::unbounded().extend_back(12), DateRange::unbounded());
    }

    #[test]
    fn percent_change_over_twelve_periods() {
        let points = (0..14)
            .map(|i| {
                let date = d(2023, 1, 1).checked_add_months(Months::new(i)).unwrap();
                Observation::new(date, Some(100.0 + i as f64))
            })
            .collect();
        let s = ObservationSeries::from_observations(points);
        let yoy = s.percent_change(12);
        assert_eq!(yoy.len(), 14);
        assert!(yoy.points()[11].value.is_none());
        let v = yoy.points()[12].value.unwrap();
        assert!((v - 12.0).abs() < 1e-9, "expected 12%, got {v}");
    }

    #[test]
    fn table_outer_joins_columns() {
        let a = ObservationSeries::from_observations(vec![
            Observation::new(d(2024, 1, 1), Some(1.0)),
            Observation::new(d(2024, 2, 1), Some(2.0)),
        ]);
        let b = ObservationSeries::from_observations(vec![
            Observation::new(d(2024, 2, 1), Some(20.0)),
            Observation::new(d(2024, 3, 1), Some(30.0)),
        ]);
        let table = SeriesTable::from_columns([("a", a.clone()), ("b", b)]);
        assert_eq!(table.columns(), ["a".to_string(), "b".to_string()]);
        assert_eq!(table.len(), 3);

        let rows: Vec<_> = table.rows().map(|(_, cells)| cells.clone()).collect();
        assert_eq!(rows[0], vec![Some(1.0), None]);
        assert_eq!(rows[1], vec![Some(2.0), Some(20.0)]);
        assert_eq!(rows[2], vec![None, Some(30.0)]);

        let col_a = table.column("a").unwrap();
        assert_eq!(col_a.len(), 3);
        assert_eq!(col_a.points()[2].value, None);
    }
}
