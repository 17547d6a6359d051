//! Offline fallback samples.
//!
//! A small CSV of recent observations is compiled into the binary and parsed
//! once on first use. Samples are keyed by the provider's series code, so an
//! HICP `INX` request never receives `ANR` numbers. Daily series carry one
//! observation per month, on that month's first trading day.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::data::normalize::parse_value;
use crate::domain::{Observation, ObservationSeries, SeriesDescriptor};
use crate::error::SeriesError;

const BUNDLED_CSV: &str = include_str!("../../assets/fallback_samples.csv");

static BUNDLED: Lazy<FallbackStore> = Lazy::new(|| match FallbackStore::from_csv(BUNDLED_CSV) {
    Ok(store) => store,
    Err(err) => {
        tracing::error!(%err, "bundled fallback samples are unreadable; offline fallback disabled");
        FallbackStore::default()
    }
});

#[derive(Debug, Deserialize)]
struct SampleRow {
    series: String,
    date: NaiveDate,
    value: String,
}

/// Immutable map from series code to sample series.
#[derive(Debug, Clone, Default)]
pub struct FallbackStore {
    samples: HashMap<String, ObservationSeries>,
}

impl FallbackStore {
    /// The process-wide store built from the compiled-in samples.
    pub fn bundled() -> &'static FallbackStore {
        &BUNDLED
    }

    /// Parse `series,date,value` rows.
    pub fn from_csv(text: &str) -> Result<Self, SeriesError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut grouped: HashMap<String, Vec<Observation>> = HashMap::new();
        for row in reader.deserialize::<SampleRow>() {
            let row = row.map_err(|e| SeriesError::Parse(format!("fallback samples: {e}")))?;
            grouped
                .entry(row.series)
                .or_default()
                .push(Observation::new(row.date, parse_value(&row.value)));
        }

        Ok(Self {
            samples: grouped
                .into_iter()
                .map(|(code, points)| (code, ObservationSeries::from_observations(points)))
                .collect(),
        })
    }

    pub fn get_fallback(&self, descriptor: &SeriesDescriptor) -> Option<&ObservationSeries> {
        self.samples.get(&descriptor.series_code())
    }
}
