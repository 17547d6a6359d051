//! Response normalization: raw payload -> `ObservationSeries`.
//!
//! Each payload format has its own parser module; this is the single place
//! that dispatches on the format tag.

use chrono::NaiveDate;

use crate::data::{ecb, fred};
use crate::domain::{Observation, ObservationSeries};
use crate::error::SeriesError;

/// Wire format of a fetched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadFormat {
    /// FRED `series/observations` JSON (API-key access).
    FredJson,
    /// FRED `fredgraph.csv` export; the column is named after the series id.
    FredGraphCsv { series_id: String },
    /// ECB SDMX-JSON (`format=jsondata`).
    SdmxJson,
}

/// Body returned by a fetch, tagged with how to parse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub format: PayloadFormat,
    pub body: String,
}

impl RawPayload {
    pub fn new(format: PayloadFormat, body: impl Into<String>) -> Self {
        Self {
            format,
            body: body.into(),
        }
    }
}

pub fn normalize(payload: &RawPayload) -> Result<ObservationSeries, SeriesError> {
    match &payload.format {
        PayloadFormat::FredJson => fred::parse_observations_json(&payload.body),
        PayloadFormat::FredGraphCsv { series_id } => fred::parse_graph_csv(&payload.body, series_id),
        PayloadFormat::SdmxJson => ecb::parse_sdmx_json(&payload.body),
    }
}

/// Coerce a textual value: blanks, FRED's `"."` and anything non-numeric are missing.
///
/// Decimal commas are accepted (`"3,25"`).
pub(crate) fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.replace(',', ".").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Build a series from `(date label, value)` rows.
///
/// Rows with an unparseable date are skipped; a payload that had rows but no
/// usable date at all is treated as schema drift.
pub(crate) fn assemble<I, F>(rows: I, parse_date: F, what: &str) -> Result<ObservationSeries, SeriesError>
where
    I: IntoIterator<Item = (String, Option<f64>)>,
    F: Fn(&str) -> Option<NaiveDate>,
{
    let mut seen = 0usize;
    let mut skipped = 0usize;
    let mut points = Vec::new();
    for (label, value) in rows {
        seen += 1;
        match parse_date(&label) {
            Some(date) => points.push(Observation::new(date, value)),
            None => skipped += 1,
        }
    }

    if seen > 0 && points.is_empty() {
        return Err(SeriesError::Parse(format!("{what}: no valid dates in {seen} rows")));
    }
    if skipped > 0 {
        tracing::warn!(what, skipped, "skipped rows with invalid dates");
    }

    Ok(ObservationSeries::from_observations(points))
}
