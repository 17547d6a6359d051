//! Series registry: logical key -> request parameters.
//!
//! Fixed FRED and Euribor series live in static tables. FX and HICP keys are
//! parametric (`fx_<cur>`, `hicp_<geo>[_<sector>]`) and expand from the
//! currency / country / sector lists below.

use crate::domain::{Endpoint, Frequency, Measure, SeriesDescriptor, Source};
use crate::error::SeriesError;

/// (key, FRED series id, display name, frequency)
const FRED_SERIES: [(&str, &str, &str, Frequency); 4] = [
    (
        "us_cpi",
        "CPIAUCSL",
        "CPI for All Urban Consumers: All Items (1982-84=100)",
        Frequency::Monthly,
    ),
    ("fed_funds", "FEDFUNDS", "Effective Federal Funds Rate (%)", Frequency::Monthly),
    ("t_bill_3m", "DTB3", "3-Month Treasury Bill: Secondary Market Rate (%)", Frequency::Daily),
    ("t_bill_6m", "DTB6", "6-Month Treasury Bill: Secondary Market Rate (%)", Frequency::Daily),
];

/// (key, ECB FM instrument code, display name)
const EURIBOR_SERIES: [(&str, &str, &str); 3] = [
    ("euribor_3m", "EURIBOR3MD_", "Euribor 3-month (%)"),
    ("euribor_6m", "EURIBOR6MD_", "Euribor 6-month (%)"),
    ("euribor_12m", "EURIBOR1YD_", "Euribor 12-month (%)"),
];

/// Currencies with a daily ECB euro reference rate.
pub const CURRENCIES: [&str; 20] = [
    "USD", "GBP", "JPY", "CHF", "CNY", "AUD", "CAD", "NOK", "SEK", "DKK", "PLN", "CZK", "HUF",
    "TRY", "ZAR", "BRL", "INR", "KRW", "MXN", "NZD",
];

/// Euro area aggregate followed by member states.
pub const EURO_AREA_CODES: [&str; 20] = [
    "U2", "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "IE", "IT", "LT", "LU", "LV", "MT",
    "NL", "PT", "SI", "SK",
];

/// HICP sector aggregates: (key suffix, column label, ECOICOP code).
pub const SECTORS: [(&str, &str, &str); 5] = [
    ("all_items", "ALL_ITEMS", "000000"),
    ("energy", "ENERGY", "NRGY00"),
    ("food", "FOOD", "FOOD00"),
    ("services", "SERVICES", "SERV00"),
    ("goods_x_energy", "GOODS_X_ENERGY", "IGXE00"),
];

const ALIASES: [(&str, &str); 4] = [
    ("cpi", "us_cpi"),
    ("reference_rate", "fed_funds"),
    ("euribor", "euribor_3m"),
    ("hicp", "hicp_u2"),
];

/// Resolves series keys for one HICP measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRegistry {
    measure: Measure,
}

impl Default for SeriesRegistry {
    fn default() -> Self {
        Self::new(Measure::Anr)
    }
}

impl SeriesRegistry {
    pub fn new(measure: Measure) -> Self {
        Self { measure }
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    /// Look up a key (case-insensitive, aliases allowed).
    pub fn lookup(&self, key: &str) -> Result<SeriesDescriptor, SeriesError> {
        let normalized = key.trim().to_ascii_lowercase();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, target)| (*target).to_string())
            .unwrap_or(normalized);

        self.resolve(&canonical).ok_or_else(|| SeriesError::UnknownSeries {
            key: key.trim().to_string(),
        })
    }

    /// Every canonical key, in catalogue order.
    pub fn keys(&self) -> Vec<String> {
        let mut out: Vec<String> = FRED_SERIES.iter().map(|(k, ..)| k.to_string()).collect();
        out.extend(EURIBOR_SERIES.iter().map(|(k, ..)| k.to_string()));
        out.extend(CURRENCIES.iter().map(|c| fx_key(c)));
        for geo in EURO_AREA_CODES {
            out.push(hicp_key(geo, None));
        }
        for (sector, ..) in SECTORS {
            for geo in EURO_AREA_CODES {
                out.push(hicp_key(geo, Some(sector)));
            }
        }
        out
    }

    fn resolve(&self, key: &str) -> Option<SeriesDescriptor> {
        if let Some((k, id, name, freq)) = FRED_SERIES.iter().find(|(k, ..)| *k == key) {
            return Some(SeriesDescriptor {
                key: k.to_string(),
                source: Source::Fred,
                endpoint: Endpoint::Fred {
                    series_id: id.to_string(),
                },
                frequency: *freq,
                display_name: name.to_string(),
            });
        }

        if let Some((k, code, name)) = EURIBOR_SERIES.iter().find(|(k, ..)| *k == key) {
            return Some(ecb(k, "FM", format!("M.U2.EUR.RT.MM.{code}.HSTA"), Frequency::Monthly, name));
        }

        if let Some(cur) = key.strip_prefix("fx_") {
            let cur = cur.to_ascii_uppercase();
            if !CURRENCIES.contains(&cur.as_str()) {
                return None;
            }
            return Some(ecb(
                key,
                "EXR",
                format!("D.{cur}.EUR.SP00.A"),
                Frequency::Daily,
                &format!("{cur} per EUR (ECB reference rate)"),
            ));
        }

        if let Some(rest) = key.strip_prefix("hicp_") {
            return self.resolve_hicp(key, rest);
        }

        None
    }

    fn resolve_hicp(&self, key: &str, rest: &str) -> Option<SeriesDescriptor> {
        let (geo, sector) = match rest.split_once('_') {
            Some((geo, sector)) => (geo, Some(sector)),
            None => (rest, None),
        };
        let geo = geo.to_ascii_uppercase();
        if !EURO_AREA_CODES.contains(&geo.as_str()) {
            return None;
        }
        let (_, label, coicop) = match sector {
            None => SECTORS[0],
            Some(s) => *SECTORS.iter().find(|(k, ..)| *k == s)?,
        };
        let measure = self.measure.code();
        Some(ecb(
            key,
            "ICP",
            format!("M.{geo}.N.{coicop}.4.{measure}"),
            Frequency::Monthly,
            &format!("HICP {label} {geo} [{measure}]"),
        ))
    }
}

pub fn fx_key(currency: &str) -> String {
    format!("fx_{}", currency.to_ascii_lowercase())
}

pub fn hicp_key(geo: &str, sector: Option<&str>) -> String {
    match sector {
        Some(s) => format!("hicp_{}_{s}", geo.to_ascii_lowercase()),
        None => format!("hicp_{}", geo.to_ascii_lowercase()),
    }
}

fn ecb(key: &str, flow: &str, series_key: String, frequency: Frequency, name: &str) -> SeriesDescriptor {
    SeriesDescriptor {
        key: key.to_string(),
        source: Source::Ecb,
        endpoint: Endpoint::Ecb {
            flow: flow.to_string(),
            key: series_key,
        },
        frequency,
        display_name: name.to_string(),
    }
}
