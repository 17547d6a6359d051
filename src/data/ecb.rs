//! ECB Data Portal (SDMX REST) request parameters and SDMX-JSON parsing.
//!
//! SDMX-JSON does not repeat the period label on each observation. A series
//! holds `observations: {"<index>": [value, attr...]}` and the index points
//! into the `TIME_PERIOD` entry of `structure.dimensions.observation`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::data::normalize::{assemble, parse_value};
use crate::domain::{format_period, parse_period_label, DateRange, Frequency, ObservationSeries};
use crate::error::SeriesError;

pub const API_URL: &str = "https://data-api.ecb.europa.eu/service/data";

/// Resource path below the service root: `<flow>/<key>`.
pub fn resource_path(flow: &str, key: &str) -> String {
    format!("{flow}/{key}")
}

/// Query for a series of the given frequency.
pub fn query(range: &DateRange, frequency: Frequency) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("format", "jsondata".to_string()),
        ("detail", "dataonly".to_string()),
    ];
    if let Some(start) = range.start {
        query.push(("startPeriod", format_period(start, frequency)));
    }
    if let Some(end) = range.end {
        query.push(("endPeriod", format_period(end, frequency)));
    }
    query
}

#[derive(Debug, Deserialize)]
struct SdmxMessage {
    #[serde(rename = "dataSets")]
    data_sets: Vec<DataSet>,
    structure: Structure,
}

#[derive(Debug, Deserialize)]
struct DataSet {
    #[serde(default)]
    series: BTreeMap<String, SdmxSeries>,
}

#[derive(Debug, Deserialize)]
struct SdmxSeries {
    #[serde(default)]
    observations: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Structure {
    dimensions: Dimensions,
}

#[derive(Debug, Deserialize)]
struct Dimensions {
    #[serde(default)]
    observation: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
struct Dimension {
    id: String,
    values: Vec<DimensionValue>,
}

#[derive(Debug, Deserialize)]
struct DimensionValue {
    id: String,
}

/// Parse an SDMX-JSON data message holding (at most) one series.
pub fn parse_sdmx_json(body: &str) -> Result<ObservationSeries, SeriesError> {
    let msg: SdmxMessage =
        serde_json::from_str(body).map_err(|e| SeriesError::Parse(format!("SDMX-JSON: {e}")))?;

    let data_set = msg
        .data_sets
        .into_iter()
        .next()
        .ok_or_else(|| SeriesError::Parse("SDMX-JSON: no dataSets".to_string()))?;

    let dims = msg.structure.dimensions.observation;
    let time_dim = dims
        .iter()
        .find(|d| d.id.eq_ignore_ascii_case("TIME_PERIOD"))
        .or_else(|| dims.first())
        .ok_or_else(|| SeriesError::Parse("SDMX-JSON: no observation dimension".to_string()))?;

    if data_set.series.len() > 1 {
        tracing::warn!(count = data_set.series.len(), "SDMX message holds several series; using the first");
    }
    let Some(series) = data_set.series.into_values().next() else {
        return Ok(ObservationSeries::default());
    };

    let mut rows = Vec::with_capacity(series.observations.len());
    for (idx, values) in series.observations {
        let pos: usize = idx
            .parse()
            .map_err(|_| SeriesError::Parse(format!("SDMX-JSON: bad observation index '{idx}'")))?;
        let label = time_dim.values.get(pos).ok_or_else(|| {
            SeriesError::Parse(format!(
                "SDMX-JSON: observation index {pos} outside {} period labels",
                time_dim.values.len()
            ))
        })?;
        rows.push((label.id.clone(), values.first().and_then(obs_value)));
    }

    assemble(rows, parse_period_label, "SDMX-JSON")
}

fn obs_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => parse_value(s),
        _ => None,
    }
}
