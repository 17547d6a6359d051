//! HTTP fetch adapter.
//!
//! One GET per call, no retries. Callers (the orchestrator) decide whether to
//! retry or fall back.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::data::normalize::{PayloadFormat, RawPayload};
use crate::data::{ecb, fred};
use crate::domain::{DateRange, Endpoint, SeriesDescriptor};
use crate::error::SeriesError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn a descriptor + window into a raw payload.
///
/// The HTTP implementation is the only one in production; tests substitute
/// canned or failing fetchers.
pub trait Fetcher {
    fn fetch(&self, descriptor: &SeriesDescriptor, range: &DateRange) -> Result<RawPayload, SeriesError>;
}

/// Base URLs for each upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub fred_api: String,
    pub fred_graph: String,
    pub ecb: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            fred_api: fred::API_URL.to_string(),
            fred_graph: fred::GRAPH_URL.to_string(),
            ecb: ecb::API_URL.to_string(),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    endpoints: Endpoints,
    fred_api_key: Option<String>,
}

impl HttpFetcher {
    pub fn new(
        endpoints: Endpoints,
        fred_api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SeriesError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("econ-series/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SeriesError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoints,
            fred_api_key: fred_api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn has_fred_api_key(&self) -> bool {
        self.fred_api_key.is_some()
    }

    fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        accept: &str,
    ) -> Result<String, SeriesError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .map_err(|e| SeriesError::Network(format!("request to {url} failed: {}", redact(e))))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SeriesError::Network(format!("{url} returned status {status}")));
        }

        resp.text()
            .map_err(|e| SeriesError::Network(format!("failed to read body from {url}: {}", redact(e))))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, descriptor: &SeriesDescriptor, range: &DateRange) -> Result<RawPayload, SeriesError> {
        tracing::debug!(key = %descriptor.key, code = %descriptor.series_code(), "fetching");
        match &descriptor.endpoint {
            Endpoint::Fred { series_id } => match &self.fred_api_key {
                Some(api_key) => {
                    let query = fred::api_query(series_id, api_key, range);
                    let body = self.get(&self.endpoints.fred_api, &query, "application/json")?;
                    Ok(RawPayload::new(PayloadFormat::FredJson, body))
                }
                None => {
                    let query = fred::graph_query(series_id, range);
                    let body = self.get(&self.endpoints.fred_graph, &query, "text/csv")?;
                    Ok(RawPayload::new(
                        PayloadFormat::FredGraphCsv {
                            series_id: series_id.clone(),
                        },
                        body,
                    ))
                }
            },
            Endpoint::Ecb { flow, key } => {
                let url = format!(
                    "{}/{}",
                    self.endpoints.ecb.trim_end_matches('/'),
                    ecb::resource_path(flow, key)
                );
                let query = ecb::query(range, descriptor.frequency);
                let body = self.get(&url, &query, "application/json")?;
                Ok(RawPayload::new(PayloadFormat::SdmxJson, body))
            }
        }
    }
}

/// reqwest errors embed the full URL, which carries the FRED API key.
fn redact(err: reqwest::Error) -> String {
    err.without_url().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::normalize;
    use crate::data::registry::SeriesRegistry;
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn endpoints(server: &mockito::Server) -> Endpoints {
        Endpoints {
            fred_api: format!("{}/fred/series/observations", server.url()),
            fred_graph: format!("{}/graph/fredgraph.csv", server.url()),
            ecb: format!("{}/service/data", server.url()),
        }
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2020, 1, 1),
            NaiveDate::from_ymd_opt(2020, 12, 31),
        )
        .unwrap()
    }

    #[test]
    fn fred_with_key_uses_json_endpoint() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/fred/series/observations")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("series_id".into(), "FEDFUNDS".into()),
                Matcher::UrlEncoded("api_key".into(), "secret".into()),
                Matcher::UrlEncoded("observation_start".into(), "2020-01-01".into()),
                Matcher::UrlEncoded("observation_end".into(), "2020-12-31".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"observations":[{"date":"2020-01-01","value":"1.55"}]}"#)
            .create();

        let fetcher =
            HttpFetcher::new(endpoints(&server), Some("secret".into()), DEFAULT_TIMEOUT).unwrap();
        let descriptor = SeriesRegistry::default().lookup("fed_funds").unwrap();
        let payload = fetcher.fetch(&descriptor, &range()).unwrap();

        mock.assert();
        assert_eq!(payload.format, PayloadFormat::FredJson);
        assert_eq!(normalize(&payload).unwrap().points()[0].value, Some(1.55));
    }

    #[test]
    fn fred_without_key_uses_graph_csv() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/graph/fredgraph.csv")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "CPIAUCSL".into()),
                Matcher::UrlEncoded("cosd".into(), "2020-01-01".into()),
            ]))
            .with_status(200)
            .with_body("observation_date,CPIAUCSL\n2020-01-01,259.1\n")
            .create();

        let fetcher = HttpFetcher::new(endpoints(&server), Some("  ".into()), DEFAULT_TIMEOUT).unwrap();
        assert!(!fetcher.has_fred_api_key());
        let descriptor = SeriesRegistry::default().lookup("us_cpi").unwrap();
        let payload = fetcher.fetch(&descriptor, &range()).unwrap();

        mock.assert();
        assert_eq!(normalize(&payload).unwrap().len(), 1);
    }

    #[test]
    fn ecb_builds_resource_path_and_period_query() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/service/data/FM/M.U2.EUR.RT.MM.EURIBOR3MD_.HSTA")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "jsondata".into()),
                Matcher::UrlEncoded("startPeriod".into(), "2020-01".into()),
                Matcher::UrlEncoded("endPeriod".into(), "2020-12".into()),
            ]))
            .with_status(200)
            .with_body("{}")
            .create();

        let fetcher = HttpFetcher::new(endpoints(&server), None, DEFAULT_TIMEOUT).unwrap();
        let descriptor = SeriesRegistry::default().lookup("euribor_3m").unwrap();
        let payload = fetcher.fetch(&descriptor, &range()).unwrap();

        mock.assert();
        assert_eq!(payload.format, PayloadFormat::SdmxJson);
    }

    #[test]
    fn non_success_status_is_a_network_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(503)
            .create();

        let fetcher = HttpFetcher::new(endpoints(&server), None, DEFAULT_TIMEOUT).unwrap();
        let descriptor = SeriesRegistry::default().lookup("fx_usd").unwrap();
        let err = fetcher.fetch(&descriptor, &range()).unwrap_err();
        assert!(matches!(err, SeriesError::Network(_)), "{err:?}");
    }

    #[test]
    fn connection_failure_is_a_network_error() {
        let eps = Endpoints {
            fred_api: "http://127.0.0.1:9/fred".into(),
            fred_graph: "http://127.0.0.1:9/graph".into(),
            ecb: "http://127.0.0.1:9/ecb".into(),
        };
        let fetcher = HttpFetcher::new(eps, Some("secret".into()), Duration::from_secs(2)).unwrap();
        let descriptor = SeriesRegistry::default().lookup("fed_funds").unwrap();
        let err = fetcher.fetch(&descriptor, &range()).unwrap_err();
        let SeriesError::Network(msg) = err else {
            panic!("expected network error");
        };
        assert!(!msg.contains("secret"), "API key leaked into error: {msg}");
    }
}
