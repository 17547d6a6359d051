//! FRED request parameters and payload parsing.
//!
//! Two access paths:
//! - `series/observations` JSON when an API key is configured
//! - the public `fredgraph.csv` export otherwise (no key needed)

use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::normalize::{assemble, parse_value};
use crate::domain::{DateRange, ObservationSeries};
use crate::error::SeriesError;

pub const API_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
pub const GRAPH_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

const OBS_LIMIT: usize = 100_000;

/// Query for the JSON observations endpoint.
pub fn api_query(series_id: &str, api_key: &str, range: &DateRange) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("series_id", series_id.to_string()),
        ("api_key", api_key.to_string()),
        ("file_type", "json".to_string()),
        ("sort_order", "asc".to_string()),
        ("limit", OBS_LIMIT.to_string()),
    ];
    if let Some(start) = range.start {
        query.push(("observation_start", start.to_string()));
    }
    if let Some(end) = range.end {
        query.push(("observation_end", end.to_string()));
    }
    query
}

/// Query for the keyless graph CSV export.
pub fn graph_query(series_id: &str, range: &DateRange) -> Vec<(&'static str, String)> {
    let mut query = vec![("id", series_id.to_string())];
    if let Some(start) = range.start {
        query.push(("cosd", start.to_string()));
    }
    if let Some(end) = range.end {
        query.push(("coed", end.to_string()));
    }
    query
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// Parse a `series/observations` JSON body.
pub fn parse_observations_json(body: &str) -> Result<ObservationSeries, SeriesError> {
    let resp: ObservationsResponse = serde_json::from_str(body)
        .map_err(|e| SeriesError::Parse(format!("FRED JSON: {e}")))?;

    assemble(
        resp.observations
            .into_iter()
            .map(|o| (o.date, parse_value(&o.value))),
        parse_iso_date,
        "FRED JSON",
    )
}

/// Parse a `fredgraph.csv` body.
///
/// The date header has changed over time (`DATE`, `observation_date`) and
/// sometimes carries a UTF-8 BOM, so both columns are matched loosely.
pub fn parse_graph_csv(body: &str, series_id: &str) -> Result<ObservationSeries, SeriesError> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SeriesError::Parse(format!("FRED CSV headers: {e}")))?
        .clone();

    let date_idx = headers
        .iter()
        .position(|h| {
            let h = h.trim_start_matches('\u{feff}');
            h.eq_ignore_ascii_case("date") || h.eq_ignore_ascii_case("observation_date")
        })
        .ok_or_else(|| SeriesError::Parse("FRED CSV: missing DATE column".to_string()))?;
    let value_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(series_id))
        .ok_or_else(|| SeriesError::Parse(format!("FRED CSV: missing {series_id} column")))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SeriesError::Parse(format!("FRED CSV row: {e}")))?;
        let date = record.get(date_idx).unwrap_or("").to_string();
        let value = record.get(value_idx).and_then(parse_value);
        rows.push((date, value));
    }

    assemble(rows, parse_iso_date, "FRED CSV")
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn json_dot_becomes_missing() {
        let body = r#"{"observations":[{"date":"2020-01-01","value":"1.5"},{"date":"2020-02-01","value":"."}]}"#;
        let series = parse_observations_json(body).unwrap();
        assert_eq!(
            series.points(),
            [
                Observation::new(d(2020, 1, 1), Some(1.5)),
                Observation::new(d(2020, 2, 1), None),
            ]
        );
    }

    #[test]
    fn json_without_observations_is_a_parse_error() {
        let err = parse_observations_json(r#"{"error_code":400}"#).unwrap_err();
        assert!(matches!(err, SeriesError::Parse(_)));
        let err = parse_observations_json("<html>").unwrap_err();
        assert!(matches!(err, SeriesError::Parse(_)));
    }

    #[test]
    fn json_extra_fields_are_ignored() {
        let body = r#"{"realtime_start":"2024-01-01","count":1,"observations":[
            {"realtime_start":"2024-01-01","realtime_end":"2024-01-01","date":"2024-01-01","value":"5.33"}
        ]}"#;
        let series = parse_observations_json(body).unwrap();
        assert_eq!(series.points()[0].value, Some(5.33));
    }

    #[test]
    fn graph_csv_handles_bom_prefixed_date_column() {
        let series = parse_graph_csv("\u{feff}DATE,FEDFUNDS\n2024-01-01,5.25\n", "FEDFUNDS").unwrap();
        assert_eq!(series.points(), [Observation::new(d(2024, 1, 1), Some(5.25))]);
    }

    #[test]
    fn graph_csv_accepts_observation_date_and_lowercase_headers() {
        let a = parse_graph_csv("observation_date,FEDFUNDS\n2024-01-01,5.25\n", "FEDFUNDS").unwrap();
        let b = parse_graph_csv("date,fedfunds\n2024-01-01,5.25\n", "FEDFUNDS").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.first_date(), Some(d(2024, 1, 1)));
    }

    #[test]
    fn graph_csv_without_series_column_fails() {
        let err = parse_graph_csv("DATE,OTHER\n2024-01-01,1\n", "FEDFUNDS").unwrap_err();
        assert!(matches!(err, SeriesError::Parse(_)));
    }

    #[test]
    fn graph_csv_keeps_missing_mid_series() {
        let body = "DATE,DTB3\n2024-01-01,5.2\n2024-01-02,.\n2024-01-03,5.1\n";
        let series = parse_graph_csv(body, "DTB3").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.present_count(), 2);
    }

    #[test]
    fn queries_include_only_given_bounds() {
        let range = DateRange::new(Some(d(2020, 1, 1)), None).unwrap();
        let q = api_query("CPIAUCSL", "k", &range);
        assert!(q.contains(&("observation_start", "2020-01-01".to_string())));
        assert!(!q.iter().any(|(k, _)| *k == "observation_end"));

        let q = graph_query("CPIAUCSL", &range);
        assert_eq!(q, vec![("id", "CPIAUCSL".to_string()), ("cosd", "2020-01-01".to_string())]);
    }
}
